//! Per-statement alias tables
//!
//! Every node carrying an `alias` (query sources, relationship clauses) binds
//! that alias to its `expression` child. Tables are keyed by library and the
//! statement's local id, since property `scope`s only make sense inside the
//! statement that declared them.

use indexmap::IndexMap;
use log::{debug, trace};
use octofhir_cqm_elm::{ElmNode, ExpressionDef, NodeKind};

/// alias -> the expression node it ranges over
pub type AliasTable<'a> = IndexMap<String, &'a ElmNode>;

#[derive(Debug, Clone, Default)]
pub struct AliasIndex<'a> {
    /// library -> statement local id -> alias table
    tables: IndexMap<String, IndexMap<String, AliasTable<'a>>>,
}

impl<'a> AliasIndex<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every alias declared anywhere inside a statement.
    ///
    /// Statements without a local id are not indexed. Returns the number of
    /// aliases recorded.
    pub fn index_statement(&mut self, library: &str, def: &'a ExpressionDef) -> usize {
        let Some(local_id) = def.local_id() else {
            trace!("{}.{} has no localId, aliases not indexed", library, def.name);
            return 0;
        };

        let mut table = AliasTable::new();
        if let Some(expression) = &def.expression {
            collect_aliases(expression, &mut table);
        }
        let count = table.len();

        self.tables
            .entry(library.to_string())
            .or_default()
            .insert(local_id.to_string(), table);
        count
    }

    pub fn table(&self, library: &str, local_id: &str) -> Option<&AliasTable<'a>> {
        self.tables.get(library).and_then(|t| t.get(local_id))
    }

    pub fn lookup(&self, library: &str, local_id: &str, alias: &str) -> Option<&'a ElmNode> {
        self.table(library, local_id).and_then(|t| t.get(alias)).copied()
    }

    /// Resolve a property scope to the criteria name it reads from.
    ///
    /// The aliased expression's `name` wins, then the value set it retrieves
    /// (directly or through one operand). An alias over a `Union` resolves to
    /// the alias itself, matching how unions are registered as roots.
    pub fn resolve_scope(&self, library: &str, local_id: &str, scope: &'a str) -> Option<&'a str> {
        let expression = self.lookup(library, local_id, scope)?;
        expression
            .name()
            .or_else(|| expression.codes_name())
            .or_else(|| (expression.kind() == &NodeKind::Union).then_some(scope))
    }

    /// Iterate `(library, local id, table)` triples
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &AliasTable<'a>)> {
        self.tables.iter().flat_map(|(library, tables)| {
            tables
                .iter()
                .map(move |(local_id, table)| (library.as_str(), local_id.as_str(), table))
        })
    }
}

fn collect_aliases<'a>(node: &'a ElmNode, table: &mut AliasTable<'a>) {
    if let Some(alias) = node.alias() {
        match node.expression() {
            Some(expression) => {
                if table.insert(alias.to_string(), expression).is_some() {
                    debug!("alias '{}' declared more than once, keeping the last", alias);
                }
            }
            None => trace!("alias '{}' has no expression", alias),
        }
    }
    for (_, child) in node.children() {
        collect_aliases(child, table);
    }
}
