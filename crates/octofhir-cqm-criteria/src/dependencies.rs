//! Statement dependency filtering
//!
//! The measure export tooling records, for every library, which statements
//! each statement depends on. Only statements that appear in that map (as a
//! key or as somebody's dependency) take part in attribute resolution.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// One edge of the statement dependency map
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatementDependency {
    pub library_name: String,
    pub statement_name: String,
}

impl StatementDependency {
    pub fn new(library_name: impl Into<String>, statement_name: impl Into<String>) -> Self {
        Self {
            library_name: library_name.into(),
            statement_name: statement_name.into(),
        }
    }
}

/// library name -> statement name -> the statements it depends on
pub type DependencyMap = IndexMap<String, IndexMap<String, Vec<StatementDependency>>>;

/// Per-library set of statement names relevant to the measure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RelevantStatements {
    by_library: IndexMap<String, IndexSet<String>>,
}

impl RelevantStatements {
    /// Collect every statement named in the dependency map.
    ///
    /// A dependency on another library's statement makes that statement
    /// relevant in its own library, creating the library entry on demand.
    pub fn from_dependencies(dependencies: &DependencyMap) -> Self {
        let mut relevant = Self::default();
        for (library, statements) in dependencies {
            for (statement, deps) in statements {
                relevant.insert(library, statement);
                for dep in deps {
                    relevant.insert(&dep.library_name, &dep.statement_name);
                }
            }
        }
        relevant
    }

    pub fn insert(&mut self, library: &str, statement: &str) {
        self.by_library
            .entry(library.to_string())
            .or_default()
            .insert(statement.to_string());
    }

    /// Whether `statement` of `library` takes part in resolution.
    ///
    /// A library missing from the dependency map has no relevant statements.
    pub fn contains(&self, library: &str, statement: &str) -> bool {
        self.by_library
            .get(library)
            .is_some_and(|names| names.contains(statement))
    }

    pub fn library(&self, library: &str) -> Option<&IndexSet<String>> {
        self.by_library.get(library)
    }

    pub fn libraries(&self) -> impl Iterator<Item = &str> {
        self.by_library.keys().map(String::as_str)
    }

    /// Total number of relevant statements across all libraries
    pub fn len(&self) -> usize {
        self.by_library.values().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
