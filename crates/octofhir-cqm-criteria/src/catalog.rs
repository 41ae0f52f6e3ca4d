//! Attribute catalog
//!
//! Lists, per QDM datatype, the attributes that may be attached to a source
//! data criterion of that datatype. A property access whose attribute the
//! catalog does not list for the criterion's datatype is not attached.

use std::sync::LazyLock;

use indexmap::{IndexMap, IndexSet};
use octofhir_cqm_diagnostics::{CQM0200, CqmError, Result};
use serde::Serialize;
use serde_json::Value;

/// Outcome of checking an attribute against the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recognition {
    Recognized,
    UnknownDatatype,
    UnknownAttribute,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttributeCatalog {
    datatypes: IndexMap<String, IndexSet<String>>,
}

impl AttributeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in QDM datatype table
    pub fn qdm() -> Self {
        QDM_CATALOG.clone()
    }

    /// Add attributes for a datatype, builder style
    pub fn with_datatype<I, S>(mut self, datatype: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(datatype, attributes);
        self
    }

    /// Add attributes for a datatype, merging with any already listed
    pub fn insert<I, S>(&mut self, datatype: impl Into<String>, attributes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.datatypes
            .entry(datatype.into())
            .or_default()
            .extend(attributes.into_iter().map(Into::into));
    }

    pub fn recognize(&self, datatype: &str, attribute: &str) -> Recognition {
        match self.datatypes.get(datatype) {
            None => Recognition::UnknownDatatype,
            Some(attributes) if attributes.contains(attribute) => Recognition::Recognized,
            Some(_) => Recognition::UnknownAttribute,
        }
    }

    pub fn attributes(&self, datatype: &str) -> Option<&IndexSet<String>> {
        self.datatypes.get(datatype)
    }

    pub fn datatypes(&self) -> impl Iterator<Item = &str> {
        self.datatypes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.datatypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datatypes.is_empty()
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)
            .map_err(|e| CqmError::config(CQM0200, format!("Attribute catalog is not valid JSON: {}", e)))?;
        Self::from_value(&value)
    }

    /// Load a catalog from `{ datatype: [attribute, ...] }`.
    ///
    /// A mapping of attribute names to arbitrary values (such as an
    /// attribute-to-field mapping table) is accepted too; only its keys are
    /// used.
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(entries) = value else {
            return Err(CqmError::config(CQM0200, "Attribute catalog must be an object"));
        };

        let mut catalog = Self::new();
        for (datatype, attributes) in entries {
            let names: Vec<&str> = match attributes {
                Value::Array(items) => items
                    .iter()
                    .map(|item| {
                        item.as_str().ok_or_else(|| {
                            CqmError::config(CQM0200, "Attribute names must be strings")
                                .with_context(datatype.clone())
                        })
                    })
                    .collect::<Result<_>>()?,
                Value::Object(map) => map.keys().map(String::as_str).collect(),
                _ => {
                    return Err(CqmError::config(
                        CQM0200,
                        "Expected a list or an object of attributes",
                    )
                    .with_context(datatype.clone()));
                }
            };
            catalog.insert(datatype.clone(), names);
        }
        Ok(catalog)
    }
}

static QDM_CATALOG: LazyLock<AttributeCatalog> = LazyLock::new(|| {
    QDM_DATATYPES
        .iter()
        .fold(AttributeCatalog::new(), |catalog, (datatype, attributes)| {
            catalog.with_datatype(*datatype, attributes.iter().copied())
        })
});

const NEGATION_RATIONALE: &str = "negationRationale";

#[rustfmt::skip]
const QDM_DATATYPES: &[(&str, &[&str])] = &[
    ("AdverseEvent", &["authorDatetime", "relevantPeriod", "severity", "facilityLocation", "type"]),
    ("AllergyIntolerance", &["authorDatetime", "prevalencePeriod", "type", "severity"]),
    ("AssessmentPerformed", &["authorDatetime", "reason", "method", "result", "components", "relatedTo", NEGATION_RATIONALE]),
    ("AssessmentRecommended", &["authorDatetime", "reason", NEGATION_RATIONALE]),
    ("CareGoal", &["relevantPeriod", "relatedTo", "targetOutcome"]),
    ("CommunicationFromPatientToProvider", &["authorDatetime", "category", "medium", "relatedTo", NEGATION_RATIONALE]),
    ("CommunicationFromProviderToPatient", &["authorDatetime", "category", "medium", "relatedTo", NEGATION_RATIONALE]),
    ("CommunicationFromProviderToProvider", &["authorDatetime", "category", "medium", "relatedTo", NEGATION_RATIONALE]),
    ("DeviceApplied", &["authorDatetime", "relevantPeriod", "reason", "anatomicalLocationSite", NEGATION_RATIONALE]),
    ("DeviceOrder", &["authorDatetime", "reason", NEGATION_RATIONALE]),
    ("DeviceRecommended", &["authorDatetime", "reason", NEGATION_RATIONALE]),
    ("Diagnosis", &["authorDatetime", "prevalencePeriod", "anatomicalLocationSite", "severity"]),
    ("DiagnosticStudyOrder", &["authorDatetime", "reason", NEGATION_RATIONALE]),
    ("DiagnosticStudyPerformed", &["authorDatetime", "relevantPeriod", "reason", "result", "resultDatetime", "status", "method", "facilityLocation", "components", NEGATION_RATIONALE]),
    ("DiagnosticStudyRecommended", &["authorDatetime", NEGATION_RATIONALE]),
    ("EncounterOrder", &["authorDatetime", "reason", "facilityLocation", NEGATION_RATIONALE]),
    ("EncounterPerformed", &["authorDatetime", "relevantPeriod", "admissionSource", "dischargeDisposition", "diagnoses", "facilityLocations", "principalDiagnosis", "lengthOfStay", NEGATION_RATIONALE]),
    ("EncounterRecommended", &["authorDatetime", "reason", "facilityLocation", NEGATION_RATIONALE]),
    ("FamilyHistory", &["authorDatetime", "relationship"]),
    ("ImmunizationAdministered", &["authorDatetime", "reason", "dosage", "supply", "route", NEGATION_RATIONALE]),
    ("ImmunizationOrder", &["activeDatetime", "authorDatetime", "dosage", "supply", "reason", "route", NEGATION_RATIONALE]),
    ("InterventionOrder", &["authorDatetime", "reason", NEGATION_RATIONALE]),
    ("InterventionPerformed", &["authorDatetime", "relevantPeriod", "reason", "result", "status", NEGATION_RATIONALE]),
    ("InterventionRecommended", &["authorDatetime", "reason", NEGATION_RATIONALE]),
    ("LaboratoryTestOrder", &["authorDatetime", "reason", "method", NEGATION_RATIONALE]),
    ("LaboratoryTestPerformed", &["authorDatetime", "relevantPeriod", "status", "method", "result", "resultDatetime", "reason", "referenceRange", "components", NEGATION_RATIONALE]),
    ("LaboratoryTestRecommended", &["authorDatetime", "method", "reason", NEGATION_RATIONALE]),
    ("MedicationActive", &["relevantPeriod", "dosage", "supply", "frequency", "route"]),
    ("MedicationAdministered", &["authorDatetime", "relevantPeriod", "dosage", "supply", "frequency", "route", "reason", NEGATION_RATIONALE]),
    ("MedicationDischarge", &["authorDatetime", "refills", "dosage", "supply", "frequency", "route", NEGATION_RATIONALE]),
    ("MedicationDispensed", &["authorDatetime", "relevantPeriod", "refills", "dosage", "supply", "frequency", "route", NEGATION_RATIONALE]),
    ("MedicationOrder", &["activeDatetime", "relevantPeriod", "authorDatetime", "refills", "dosage", "supply", "frequency", "route", "method", "reason", NEGATION_RATIONALE]),
    ("Participation", &["participationPeriod"]),
    ("PatientCareExperience", &["authorDatetime"]),
    ("PatientCharacteristicExpired", &["expiredDatetime", "cause"]),
    ("PhysicalExamOrder", &["authorDatetime", "reason", "method", "anatomicalLocationSite", NEGATION_RATIONALE]),
    ("PhysicalExamPerformed", &["authorDatetime", "relevantPeriod", "reason", "method", "result", "anatomicalLocationSite", "components", NEGATION_RATIONALE]),
    ("PhysicalExamRecommended", &["authorDatetime", "reason", "method", "anatomicalLocationSite", NEGATION_RATIONALE]),
    ("ProcedureOrder", &["authorDatetime", "reason", "method", "anatomicalApproachSite", "anatomicalLocationSite", "ordinality", NEGATION_RATIONALE]),
    ("ProcedurePerformed", &["authorDatetime", "relevantPeriod", "reason", "method", "result", "status", "anatomicalApproachSite", "anatomicalLocationSite", "ordinality", "incisionDatetime", "components", NEGATION_RATIONALE]),
    ("ProcedureRecommended", &["authorDatetime", "reason", "method", "anatomicalApproachSite", "anatomicalLocationSite", "ordinality", NEGATION_RATIONALE]),
    ("ProviderCareExperience", &["authorDatetime"]),
    ("SubstanceAdministered", &["authorDatetime", "relevantPeriod", "dosage", "supply", "frequency", "route", NEGATION_RATIONALE]),
    ("SubstanceOrder", &["authorDatetime", "relevantPeriod", "reason", "dosage", "supply", "frequency", "refills", "route", NEGATION_RATIONALE]),
    ("SubstanceRecommended", &["authorDatetime", "reason", "dosage", "frequency", "refills", "route", NEGATION_RATIONALE]),
    ("Symptom", &["prevalencePeriod", "severity"]),
];

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("EncounterPerformed", "relevantPeriod", Recognition::Recognized)]
    #[case("MedicationOrder", "refills", Recognition::Recognized)]
    #[case("Diagnosis", "dosage", Recognition::UnknownAttribute)]
    #[case("EncounterPerformedd", "relevantPeriod", Recognition::UnknownDatatype)]
    fn test_qdm_catalog(#[case] datatype: &str, #[case] attribute: &str, #[case] expected: Recognition) {
        assert_eq!(AttributeCatalog::qdm().recognize(datatype, attribute), expected);
    }

    #[test]
    fn test_from_json_lists_and_mappings() {
        let catalog = AttributeCatalog::from_json_str(
            r#"{
                "EncounterPerformed": ["relevantPeriod", "facilityLocations"],
                "Diagnosis": { "prevalencePeriod": "start_time", "severity": "severity" }
            }"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.recognize("Diagnosis", "severity"), Recognition::Recognized);
        assert_eq!(
            catalog.recognize("EncounterPerformed", "severity"),
            Recognition::UnknownAttribute
        );
    }

    #[rstest]
    #[case("[]")]
    #[case(r#"{"Diagnosis": 3}"#)]
    #[case(r#"{"Diagnosis": [1]}"#)]
    #[case("not json")]
    fn test_malformed_catalog(#[case] input: &str) {
        let err = AttributeCatalog::from_json_str(input).unwrap_err();
        assert_eq!(err.code(), CQM0200);
    }

    #[test]
    fn test_builder_merges() {
        let catalog = AttributeCatalog::new()
            .with_datatype("Symptom", ["severity"])
            .with_datatype("Symptom", ["prevalencePeriod"]);
        assert_eq!(catalog.attributes("Symptom").map(IndexSet::len), Some(2));
    }
}
