//! Attaching attribute triples to source data criteria

use log::{debug, trace};
use octofhir_cqm_diagnostics::{CQM0101, CQM0102, CQM0103, CQM0104, CQM0105, Diagnostic, ErrorCode};
use serde::Serialize;

use crate::catalog::{AttributeCatalog, Recognition};
use crate::context::ResolutionContext;
use crate::criteria::{AttributeDescriptor, SourceDataCriteria};
use crate::properties::AttributeTriple;

/// Why a triple was not attached to a matching criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Negated,
    Duplicate,
    UnknownDatatype,
    UnknownAttribute,
}

impl SkipReason {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Negated => CQM0104,
            Self::Duplicate => CQM0103,
            Self::UnknownDatatype => CQM0101,
            Self::UnknownAttribute => CQM0102,
        }
    }
}

/// A triple that matched a criterion but was not attached to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedAttribute {
    pub criterion: String,
    pub attribute: String,
    pub reason: SkipReason,
}

impl SkippedAttribute {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::info(
            self.reason.code(),
            format!("'{}' not attached ({})", self.attribute, self.reason.code().info().description),
        )
        .with_location(self.criterion.clone())
    }
}

/// Summary of one annotation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationReport {
    /// Triples extracted from the logic
    pub triples: usize,
    /// Attributes appended to criteria
    pub attached: usize,
    /// Triples whose criteria name resolved to no value set
    pub unresolved: usize,
    /// Triples naming a qualifying value set that is not declared
    pub missing_value_sets: usize,
    pub skipped: Vec<SkippedAttribute>,
}

impl AnnotationReport {
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }

    /// Skipped attributes as notes, then a warning for undeclared qualifiers
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics: Vec<_> = self.skipped.iter().map(SkippedAttribute::to_diagnostic).collect();
        if self.missing_value_sets > 0 {
            diagnostics.push(Diagnostic::warning(
                CQM0105,
                format!(
                    "{} attribute(s) attached without a qualifying value set",
                    self.missing_value_sets
                ),
            ));
        }
        diagnostics
    }
}

/// Append the descriptor of every triple to the criteria it resolves to.
///
/// A criterion receives a triple when its `code_list_id` is one of the value
/// set identifiers the triple's criteria name resolves to, it is not negated,
/// the descriptor is not already present, and the catalog lists the
/// attribute for the criterion's datatype.
pub fn attach(
    triples: &[AttributeTriple],
    ctx: &ResolutionContext<'_>,
    criteria: &mut SourceDataCriteria,
    catalog: &AttributeCatalog,
    negation_marker: &str,
) -> AnnotationReport {
    let mut report = AnnotationReport {
        triples: triples.len(),
        ..AnnotationReport::default()
    };

    for triple in triples {
        let value_sets = ctx.resolve_value_sets(&triple.criteria);
        if value_sets.is_empty() {
            trace!("'{}' resolves to no value set", triple.criteria);
            report.unresolved += 1;
            continue;
        }

        let qualifier = match &triple.value_set {
            Some(name) => {
                let id = ctx.value_sets.id(name);
                if id.is_none() {
                    debug!("{}: qualifying value set '{}' is not declared", CQM0105, name);
                    report.missing_value_sets += 1;
                }
                id.map(str::to_string)
            }
            None => None,
        };
        let descriptor = AttributeDescriptor::new(triple.attribute.clone(), qualifier);

        for (key, criterion) in criteria.iter_mut() {
            let matches = criterion
                .code_list_id
                .as_ref()
                .is_some_and(|id| value_sets.contains(id));
            if !matches {
                continue;
            }

            let reason = if criterion.is_negated(negation_marker) {
                Some(SkipReason::Negated)
            } else if criterion.has_attribute(&descriptor) {
                Some(SkipReason::Duplicate)
            } else {
                match catalog.recognize(&criterion.datatype(), &triple.attribute) {
                    Recognition::Recognized => None,
                    Recognition::UnknownDatatype => Some(SkipReason::UnknownDatatype),
                    Recognition::UnknownAttribute => Some(SkipReason::UnknownAttribute),
                }
            };

            match reason {
                None => {
                    debug!("attaching '{}' to {}", triple.attribute, key);
                    criterion.attributes.push(descriptor.clone());
                    report.attached += 1;
                }
                Some(reason) => {
                    trace!("'{}' not attached to {}: {:?}", triple.attribute, key, reason);
                    report.skipped.push(SkippedAttribute {
                        criterion: key.clone(),
                        attribute: triple.attribute.clone(),
                        reason,
                    });
                }
            }
        }
    }
    report
}
