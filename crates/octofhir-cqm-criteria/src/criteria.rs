//! Source data criteria
//!
//! The records the engine annotates. Only `description`, `code_list_id` and
//! `attributes` are interpreted; every other field is carried through
//! untouched so an annotated measure serializes back with its full content.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// An attribute attached to a criterion
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub attribute_name: String,
    /// Identifier of the qualifying value set, if any
    #[serde(default)]
    pub attribute_valueset: Option<String>,
}

impl AttributeDescriptor {
    pub fn new(attribute_name: impl Into<String>, attribute_valueset: Option<String>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            attribute_valueset,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDataCriterion {
    /// e.g. `Encounter, Performed: Inpatient`
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub code_list_id: Option<String>,
    #[serde(default, deserialize_with = "nullable_list")]
    pub attributes: Vec<AttributeDescriptor>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Source data criteria keyed by their identifier
pub type SourceDataCriteria = IndexMap<String, SourceDataCriterion>;

impl SourceDataCriterion {
    pub fn new(description: impl Into<String>, code_list_id: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            code_list_id: Some(code_list_id.into()),
            ..Self::default()
        }
    }

    /// Whether the description marks this as a negated criterion
    pub fn is_negated(&self, marker: &str) -> bool {
        !marker.is_empty() && self.description.contains(marker)
    }

    /// Compact datatype name derived from the description
    pub fn datatype(&self) -> String {
        derive_datatype(&self.description)
    }

    /// Whether an equal descriptor is already attached
    pub fn has_attribute(&self, descriptor: &AttributeDescriptor) -> bool {
        self.attributes.contains(descriptor)
    }
}

/// Derive the compact datatype name from a criterion description.
///
/// `"Encounter, Performed: Inpatient"` becomes `"EncounterPerformed"`. When
/// the description has more than one `:` the first two segments are joined.
/// Whitespace, commas and slashes are removed, and the legacy `Ordered`
/// spelling becomes `Order`.
pub fn derive_datatype(description: &str) -> String {
    let mut segments: Vec<&str> = description.split(':').collect();
    // Trailing empty segments do not count towards the segment total
    while segments.last().is_some_and(|s| s.is_empty()) {
        segments.pop();
    }
    let head = if segments.len() > 2 {
        segments[..2].concat()
    } else {
        segments.first().copied().unwrap_or_default().to_string()
    };

    let compact: String = head
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && *c != '/')
        .collect();
    compact.replacen("Ordered", "Order", 1)
}

fn nullable_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<AttributeDescriptor>, D::Error> {
    Ok(Option::<Vec<AttributeDescriptor>>::deserialize(deserializer)?.unwrap_or_default())
}
