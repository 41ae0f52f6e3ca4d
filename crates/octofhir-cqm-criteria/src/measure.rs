//! Measure input documents
//!
//! A measure bundles its compiled libraries, the statement dependency map
//! and the source data criteria to annotate:
//!
//! ```json
//! {
//!   "elm": [ { "library": { ... } } ],
//!   "cql_statement_dependencies": { "Main": { "Numerator": [ ... ] } },
//!   "source_data_criteria": { "id": { "description": "...", "code_list_id": "..." } }
//! }
//! ```

use std::io::Read;

use octofhir_cqm_diagnostics::{CQM0004, CQM0005, CQM0006, CqmError, ErrorCode, Result};
use octofhir_cqm_elm::ElmDocument;
use serde_json::{Map, Value};

use crate::criteria::SourceDataCriteria;
use crate::dependencies::DependencyMap;

#[derive(Debug, Clone, Default)]
pub struct MeasureInput {
    pub libraries: Vec<ElmDocument>,
    pub dependencies: DependencyMap,
    pub source_data_criteria: SourceDataCriteria,
}

impl MeasureInput {
    pub fn new(libraries: Vec<ElmDocument>, dependencies: DependencyMap) -> Self {
        Self {
            libraries,
            dependencies,
            source_data_criteria: SourceDataCriteria::new(),
        }
    }

    pub fn with_source_data_criteria(mut self, criteria: SourceDataCriteria) -> Self {
        self.source_data_criteria = criteria;
        self
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::from_json_str(&content)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(CqmError::input(CQM0004, "Measure document must be an object"));
        };

        let libraries = match map.remove("elm") {
            Some(Value::Array(items)) => load_libraries(items)?,
            Some(_) => return Err(CqmError::input(CQM0004, "`elm` must be a list of ELM documents")),
            None => return Err(CqmError::input(CQM0004, "Measure document has no `elm` member")),
        };

        let dependencies = take_member(&mut map, "cql_statement_dependencies", CQM0006)?;
        let source_data_criteria = take_member(&mut map, "source_data_criteria", CQM0005)?;

        Ok(Self {
            libraries,
            dependencies,
            source_data_criteria,
        })
    }

    /// Source data criteria as JSON, in input order
    pub fn source_data_criteria_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(&self.source_data_criteria)?)
    }
}

/// Load every library, reporting all failing positions together
fn load_libraries(items: Vec<Value>) -> Result<Vec<ElmDocument>> {
    let mut libraries = Vec::with_capacity(items.len());
    let mut errors = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        match ElmDocument::from_value(item) {
            Ok(doc) => libraries.push(doc),
            Err(e) => errors.push(e.with_context(format!("elm[{}]", index))),
        }
    }
    match CqmError::from_errors(errors) {
        Some(err) => Err(err),
        None => Ok(libraries),
    }
}

/// Deserialize an optional member, defaulting when absent or null
fn take_member<T>(map: &mut Map<String, Value>, key: &str, code: ErrorCode) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    match map.remove(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| CqmError::input(code, format!("Invalid `{}`: {}", key, e))),
    }
}
