//! ELM library structures
//!
//! Only the parts of an ELM library the attribute engine consumes are typed
//! here: the identifier, the statement definitions and the value set / code
//! definition sections. Everything else in the document is ignored.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::node::ElmNode;

// ============================================================================
// Library Structure
// ============================================================================

/// One compiled library document: `{ "library": { ... } }`
#[derive(Debug, Clone, Deserialize)]
pub struct ElmDocument {
    pub library: Library,
}

/// ELM Library - the root element containing a compiled CQL library
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    /// Library identifier
    pub identifier: VersionedIdentifier,
    /// Value sets
    #[serde(default)]
    pub value_sets: Option<ValueSetDefs>,
    /// Codes
    #[serde(default)]
    pub codes: Option<CodeDefs>,
    /// Statements (expression and function definitions)
    #[serde(default)]
    pub statements: Option<Statements>,
}

impl Library {
    /// The library identifier (`identifier.id`)
    pub fn id(&self) -> &str {
        &self.identifier.id
    }

    /// Statement definitions in document order
    pub fn statements(&self) -> &[ExpressionDef] {
        self.statements.as_ref().map(|s| s.defs.as_slice()).unwrap_or_default()
    }

    /// Look up a statement by name
    pub fn statement(&self, name: &str) -> Option<&ExpressionDef> {
        self.statements().iter().find(|def| def.name == name)
    }

    /// `(name, id)` pairs of the value set definitions followed by the code definitions
    pub fn terminology(&self) -> impl Iterator<Item = (&str, &str)> {
        let value_sets = self
            .value_sets
            .iter()
            .flat_map(|v| v.defs.iter().map(|d| (d.name.as_str(), d.id.as_str())));
        let codes = self
            .codes
            .iter()
            .flat_map(|c| c.defs.iter().map(|d| (d.name.as_str(), d.id.as_str())));
        value_sets.chain(codes)
    }
}

/// Versioned identifier for libraries
#[derive(Debug, Clone, Deserialize)]
pub struct VersionedIdentifier {
    /// Identifier
    pub id: String,
    /// Version
    #[serde(default)]
    pub version: Option<String>,
}

// ============================================================================
// Definition Containers
// ============================================================================

/// Container for value set definitions
#[derive(Debug, Clone, Deserialize)]
pub struct ValueSetDefs {
    #[serde(rename = "def", default)]
    pub defs: Vec<ValueSetDef>,
}

/// Container for code definitions
#[derive(Debug, Clone, Deserialize)]
pub struct CodeDefs {
    #[serde(rename = "def", default)]
    pub defs: Vec<CodeDef>,
}

/// Container for statements
#[derive(Debug, Clone, Deserialize)]
pub struct Statements {
    #[serde(rename = "def", default)]
    pub defs: Vec<ExpressionDef>,
}

// ============================================================================
// Definitions
// ============================================================================

/// Value set definition
#[derive(Debug, Clone, Deserialize)]
pub struct ValueSetDef {
    pub name: String,
    /// Value set OID/URI
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Code definition
#[derive(Debug, Clone, Deserialize)]
pub struct CodeDef {
    pub name: String,
    /// Code value
    pub id: String,
    #[serde(default)]
    pub display: Option<String>,
}

/// Expression (or function) definition
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionDef {
    pub name: String,
    /// Compiler-assigned local id; emitted as a string or a number depending on the translator
    #[serde(default, deserialize_with = "string_or_number")]
    pub local_id: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub expression: Option<ElmNode>,
}

impl ExpressionDef {
    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_library_accessors() {
        let doc: ElmDocument = serde_json::from_value(json!({
            "library": {
                "identifier": { "id": "Diabetes", "version": "1.0.0" },
                "valueSets": { "def": [{ "name": "HbA1c", "id": "2.16.840.1.113883.3.464.1003.198.12.1013" }] },
                "codes": { "def": [{ "name": "Birthdate", "id": "21112-8", "codeSystem": { "name": "LOINC" } }] },
                "statements": { "def": [
                    { "name": "Patient", "context": "Patient" },
                    { "name": "HbA1c Tests", "localId": 12, "expression": { "type": "Retrieve" } }
                ] }
            }
        }))
        .unwrap();

        let lib = &doc.library;
        assert_eq!(lib.id(), "Diabetes");
        assert_eq!(lib.statements().len(), 2);
        assert_eq!(lib.statement("HbA1c Tests").and_then(ExpressionDef::local_id), Some("12"));
        assert!(lib.statement("Patient").unwrap().expression.is_none());

        let terms: Vec<_> = lib.terminology().collect();
        assert_eq!(
            terms,
            vec![
                ("HbA1c", "2.16.840.1.113883.3.464.1003.198.12.1013"),
                ("Birthdate", "21112-8"),
            ]
        );
    }

    #[test]
    fn test_library_without_sections() {
        let doc: ElmDocument =
            serde_json::from_value(json!({ "library": { "identifier": { "id": "Empty" } } })).unwrap();
        assert!(doc.library.statements().is_empty());
        assert_eq!(doc.library.terminology().count(), 0);
    }
}
