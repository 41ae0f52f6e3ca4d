//! ELM JSON loading
//!
//! Accepts both the standard `{ "library": ... }` envelope and a bare library
//! object. Structural problems the engine cannot work around (no identifier,
//! a statement list that is not a list) are reported with a specific code;
//! everything below the statement level is accepted as-is.

use std::io::Read;

use octofhir_cqm_diagnostics::{CQM0001, CQM0002, CQM0003, CqmError, Result};
use serde_json::Value;

use crate::library::{ElmDocument, Library};

impl ElmDocument {
    /// Parse an ELM document from a JSON string
    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_value(value)
    }

    /// Parse an ELM document from a reader
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Self::from_json_str(&content)
    }

    /// Build an ELM document from an already parsed JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        let library = match value {
            Value::Object(mut map) => match map.remove("library") {
                Some(library) => library,
                // Bare library object
                None if map.contains_key("identifier") => Value::Object(map),
                None => {
                    return Err(CqmError::input(CQM0001, "ELM document has no `library` member"));
                }
            },
            other => {
                return Err(CqmError::input(
                    CQM0001,
                    format!("ELM document must be an object, found {}", json_kind(&other)),
                ));
            }
        };

        check_shape(&library)?;

        let library: Library = serde_json::from_value(library)
            .map_err(|e| CqmError::input(CQM0001, format!("Invalid ELM library: {}", e)))?;
        Ok(Self { library })
    }
}

/// Validate the structure the engine depends on before typed deserialization
fn check_shape(library: &Value) -> Result<()> {
    let id = library
        .pointer("/identifier/id")
        .and_then(Value::as_str)
        .ok_or_else(|| CqmError::input(CQM0002, "ELM library has no `identifier.id`"))?;

    match library.pointer("/statements/def") {
        None | Some(Value::Array(_)) => Ok(()),
        Some(other) => Err(CqmError::input(
            CQM0003,
            format!("`statements.def` must be a list, found {}", json_kind(other)),
        )
        .with_context(id.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
