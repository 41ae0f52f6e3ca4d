//! Statement complexity
//!
//! A rough branch count per statement: boolean connectives add up their
//! operands, a query counts its `where` and its relationship clauses, and
//! any other expression counts as one.

use octofhir_cqm_elm::{ElmDocument, ElmNode, ElmValue, NodeKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementComplexity {
    pub library: String,
    pub statement: String,
    pub complexity: usize,
}

/// Complexity of every statement of every library, in document order
pub fn statement_complexity(libraries: &[ElmDocument]) -> Vec<StatementComplexity> {
    libraries
        .iter()
        .flat_map(|doc| {
            let library = doc.library.id();
            doc.library.statements().iter().map(move |def| StatementComplexity {
                library: library.to_string(),
                statement: def.name.clone(),
                complexity: def.expression.as_ref().map(expression_complexity).unwrap_or(0),
            })
        })
        .collect()
}

pub fn expression_complexity(node: &ElmNode) -> usize {
    match node.kind() {
        NodeKind::And | NodeKind::Or | NodeKind::Not => value_complexity(node.field("operand")),
        NodeKind::Query => value_complexity(node.field("where")) + value_complexity(node.field("relationship")),
        _ => 1,
    }
}

fn value_complexity(value: Option<&ElmValue>) -> usize {
    match value {
        Some(ElmValue::Node(node)) => expression_complexity(node),
        Some(ElmValue::List(items)) => items.iter().map(|item| value_complexity(Some(item))).sum(),
        _ => 0,
    }
}
