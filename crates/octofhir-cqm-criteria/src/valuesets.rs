//! Value set name table
//!
//! Maps the local names libraries give their value sets and direct codes to
//! the identifiers source data criteria carry in `code_list_id`.

use indexmap::IndexMap;
use log::debug;
use octofhir_cqm_elm::Library;
use serde::Serialize;

/// A registered value set (or direct code) name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueSetEntry {
    pub id: String,
    /// Library that declared the name
    pub library: String,
}

/// Name to identifier table merged across every library of a measure.
///
/// Attribute triples do not carry the library they were found in, so names
/// share one namespace; a later library redeclaring a name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValueSetTable {
    entries: IndexMap<String, ValueSetEntry>,
}

impl ValueSetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the value set and code definitions of a library
    pub fn register_library(&mut self, library: &Library) {
        for (name, id) in library.terminology() {
            self.insert(library.id(), name, id);
        }
    }

    pub fn insert(&mut self, library: &str, name: &str, id: &str) {
        let entry = ValueSetEntry {
            id: id.to_string(),
            library: library.to_string(),
        };
        if let Some(previous) = self.entries.insert(name.to_string(), entry) {
            debug!(
                "value set name '{}' redeclared by {} (was {} in {})",
                name, library, previous.id, previous.library
            );
        }
    }

    /// Identifier registered for `name`
    pub fn id(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|e| e.id.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ValueSetEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValueSetEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
