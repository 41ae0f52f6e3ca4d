//! Resolution context
//!
//! Holds the tables built while scanning the relevant statements of a
//! measure and answers the question the attacher asks: which value set
//! identifiers does a criteria name ultimately stand for?

use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};
use log::debug;
use serde::Serialize;

use crate::aliases::AliasIndex;
use crate::classifier::StatementShape;
use crate::dependencies::RelevantStatements;
use crate::unions::UnionRegistry;
use crate::valuesets::ValueSetTable;

/// What a root criteria name is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RootBinding {
    /// A value set name, another statement, or the key itself
    Name(String),
    /// Flattened union membership
    Members(Vec<String>),
}

impl RootBinding {
    /// Names this binding points at
    pub fn names(&self) -> &[String] {
        match self {
            Self::Name(name) => std::slice::from_ref(name),
            Self::Members(members) => members,
        }
    }

    /// Whether this is the self-binding `key -> key`
    pub fn is_self(&self, key: &str) -> bool {
        matches!(self, Self::Name(name) if name == key)
    }
}

/// How a relevant statement was classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub library: String,
    pub statement: String,
    pub shape: StatementShape,
}

/// Tables shared by the resolution passes
#[derive(Debug, Default)]
pub struct ResolutionContext<'a> {
    pub(crate) relevant: RelevantStatements,
    pub(crate) value_sets: ValueSetTable,
    pub(crate) aliases: AliasIndex<'a>,
    pub(crate) unions: UnionRegistry<'a>,
    pub(crate) root: IndexMap<String, RootBinding>,
    pub(crate) non_root: IndexMap<String, Vec<String>>,
    /// library -> statement local id -> alias -> referenced statement
    pub(crate) alias_sources: IndexMap<String, IndexMap<String, IndexMap<String, String>>>,
    /// library -> statement -> names it draws from
    pub(crate) statement_sources: IndexMap<String, IndexMap<String, Vec<String>>>,
    pub(crate) classifications: Vec<Classification>,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(relevant: RelevantStatements) -> Self {
        Self {
            relevant,
            ..Self::default()
        }
    }

    pub fn relevant(&self) -> &RelevantStatements {
        &self.relevant
    }

    pub fn value_sets(&self) -> &ValueSetTable {
        &self.value_sets
    }

    pub fn aliases(&self) -> &AliasIndex<'a> {
        &self.aliases
    }

    pub fn root_criteria(&self) -> &IndexMap<String, RootBinding> {
        &self.root
    }

    pub fn non_root_criteria(&self) -> &IndexMap<String, Vec<String>> {
        &self.non_root
    }

    pub fn unions(&self) -> &IndexMap<String, Vec<String>> {
        self.unions.members()
    }

    pub fn alias_sources(&self) -> &IndexMap<String, IndexMap<String, IndexMap<String, String>>> {
        &self.alias_sources
    }

    pub fn statement_sources(&self) -> &IndexMap<String, IndexMap<String, Vec<String>>> {
        &self.statement_sources
    }

    pub fn classifications(&self) -> &[Classification] {
        &self.classifications
    }

    pub(crate) fn bind_root(&mut self, name: &str, binding: RootBinding) {
        if let Some(previous) = self.root.insert(name.to_string(), binding) {
            debug!("root criteria '{}' rebound (was {:?})", name, previous);
        }
    }

    pub(crate) fn bind_non_root(&mut self, name: &str, sources: Vec<String>) {
        self.non_root.insert(name.to_string(), sources);
    }

    pub(crate) fn record_alias_source(
        &mut self,
        library: &str,
        local_id: Option<&str>,
        alias: &str,
        statement: &str,
    ) {
        let Some(local_id) = local_id else {
            return;
        };
        self.alias_sources
            .entry(library.to_string())
            .or_default()
            .entry(local_id.to_string())
            .or_default()
            .insert(alias.to_string(), statement.to_string());
    }

    pub(crate) fn record_statement_sources(&mut self, library: &str, statement: &str, sources: &[String]) {
        let mut unique: Vec<String> = Vec::with_capacity(sources.len());
        for source in sources {
            if !unique.contains(source) {
                unique.push(source.clone());
            }
        }
        self.statement_sources
            .entry(library.to_string())
            .or_default()
            .insert(statement.to_string(), unique);
    }

    /// Install flattened union memberships as root bindings
    pub(crate) fn flatten_unions(&mut self) {
        self.unions.flatten();
        let members: Vec<(String, Vec<String>)> = self
            .unions
            .members()
            .iter()
            .map(|(name, members)| (name.clone(), members.clone()))
            .collect();
        for (name, members) in members {
            self.bind_root(&name, RootBinding::Members(members));
        }
    }

    /// Value set identifiers `name` ultimately stands for.
    ///
    /// Follows root bindings, then non-root source lists, then the value set
    /// table. A name that is itself a registered value set terminates with
    /// its id. Each name is visited at most once, so cyclic references end.
    pub fn resolve_value_sets(&self, name: &str) -> IndexSet<String> {
        let mut found = IndexSet::new();
        let mut visited = HashSet::new();
        self.chase(name, &mut visited, &mut found);
        found
    }

    fn chase<'s>(&'s self, name: &'s str, visited: &mut HashSet<&'s str>, found: &mut IndexSet<String>) {
        if !visited.insert(name) {
            return;
        }

        if let Some(binding) = self.root.get(name) {
            if let Some(id) = self.value_sets.id(name) {
                found.insert(id.to_string());
            } else if !binding.is_self(name) {
                for next in binding.names() {
                    self.chase(next, visited, found);
                }
            }
        } else if let Some(sources) = self.non_root.get(name) {
            for next in sources {
                self.chase(next, visited, found);
            }
        } else if let Some(id) = self.value_sets.id(name) {
            found.insert(id.to_string());
        }
    }
}
