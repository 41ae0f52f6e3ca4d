//! Property access extraction
//!
//! Walks a statement's expression tree looking for `Property` nodes. Each
//! one whose scope resolves to a criteria name yields an [`AttributeTriple`]:
//! the attribute read, the criteria it is read from, and the value set that
//! qualifies the comparison, taken from the node's position in the tree.

use log::trace;
use octofhir_cqm_diagnostics::CQM0100;
use octofhir_cqm_elm::{ElmNode, ExpressionDef, NodeKind};
use serde::Serialize;

use crate::aliases::AliasIndex;

/// One attribute access discovered in the logic
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeTriple {
    /// Property path, e.g. `relevantPeriod`
    pub attribute: String,
    /// Criteria name the property scope resolved to
    pub criteria: String,
    /// Name of the qualifying value set, when the access has one
    pub value_set: Option<String>,
    pub library: String,
    pub statement: String,
}

/// A node together with where it sits in the tree
#[derive(Debug, Clone, Copy)]
struct Visit<'a> {
    node: &'a ElmNode,
    parent: Option<&'a ElmNode>,
    /// Field of the parent holding the node
    field: &'a str,
    grandparent: Option<&'a ElmNode>,
}

pub struct PropertyWalker<'w, 'a> {
    aliases: &'w AliasIndex<'a>,
    library: &'w str,
    statement: &'a ExpressionDef,
    triples: Vec<AttributeTriple>,
}

impl<'w, 'a> PropertyWalker<'w, 'a> {
    /// Collect the attribute triples of one statement
    pub fn walk(aliases: &'w AliasIndex<'a>, library: &'w str, statement: &'a ExpressionDef) -> Vec<AttributeTriple> {
        let mut walker = Self {
            aliases,
            library,
            statement,
            triples: Vec::new(),
        };
        if let Some(expression) = &statement.expression {
            walker.visit(Visit {
                node: expression,
                parent: None,
                field: "expression",
                grandparent: None,
            });
        }
        walker.triples
    }

    fn visit(&mut self, visit: Visit<'a>) {
        if visit.node.kind() == &NodeKind::Property {
            self.property(visit);
        }
        for (field, child) in visit.node.children() {
            self.visit(Visit {
                node: child,
                parent: Some(visit.node),
                field,
                grandparent: visit.parent,
            });
        }
    }

    fn property(&mut self, visit: Visit<'a>) {
        let Some(value_set) = qualifying_value_set(visit) else {
            return;
        };
        let Some(attribute) = visit.node.path() else {
            return;
        };
        let Some(scope) = visit.node.scope() else {
            trace!("{}.{}: property '{}' has no scope", self.library, self.statement.name, attribute);
            return;
        };
        let criteria = self
            .statement
            .local_id()
            .and_then(|local_id| self.aliases.resolve_scope(self.library, local_id, scope));
        let Some(criteria) = criteria else {
            trace!(
                "{}: {}.{}: scope '{}' of '{}' does not resolve",
                CQM0100, self.library, self.statement.name, scope, attribute
            );
            return;
        };

        self.triples.push(AttributeTriple {
            attribute: attribute.to_string(),
            criteria: criteria.to_string(),
            value_set: value_set.map(str::to_string),
            library: self.library.to_string(),
            statement: self.statement.name.clone(),
        });
    }
}

/// Qualifying value set for a property access.
///
/// `None` means the access yields no triple; `Some(None)` a triple without
/// a value set. The first matching position wins.
fn qualifying_value_set(visit: Visit<'_>) -> Option<Option<&str>> {
    let code_path = visit.node.path() == Some("code");
    let parent_kind = visit.parent.map(ElmNode::kind);
    let grandparent_kind = visit.grandparent.map(ElmNode::kind);

    if visit.field == "code" && !code_path {
        return Some(visit.parent.and_then(ElmNode::valueset_name));
    }
    if matches!(visit.field, "expression" | "where") && !code_path {
        // Only qualified through an enclosing filter
        return visit
            .grandparent
            .and_then(ElmNode::where_clause)
            .and_then(ElmNode::valueset_name)
            .map(Some);
    }
    if grandparent_kind == Some(&NodeKind::Equivalent) {
        return Some(visit.grandparent.and_then(ElmNode::second_operand_name));
    }
    if grandparent_kind == Some(&NodeKind::InValueSet) {
        return Some(visit.grandparent.and_then(ElmNode::valueset_name));
    }
    if parent_kind == Some(&NodeKind::Equivalent) {
        return Some(visit.parent.and_then(ElmNode::second_operand_name));
    }
    if visit.field != "code" && !code_path {
        return Some(None);
    }
    None
}
