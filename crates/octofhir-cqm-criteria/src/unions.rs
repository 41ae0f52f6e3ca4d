//! Union membership flattening
//!
//! A union registered under a name (a statement, or a query alias ranging
//! over a union) is resolved to the names of everything it draws from:
//! referenced statements and the value sets or codes of direct retrieves.

use indexmap::IndexMap;
use octofhir_cqm_elm::{ANNOTATION_FIELD, ElmNode, NodeKind};

#[derive(Debug, Clone, Default)]
pub struct UnionRegistry<'a> {
    pending: Vec<(String, &'a ElmNode)>,
    members: IndexMap<String, Vec<String>>,
}

impl<'a> UnionRegistry<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `element` to be flattened under `name`
    pub fn register(&mut self, name: &str, element: &'a ElmNode) {
        self.members.entry(name.to_string()).or_default();
        self.pending.push((name.to_string(), element));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Flatten every registered element into its member list.
    ///
    /// Several elements registered under one name share a member list.
    pub fn flatten(&mut self) {
        for (name, element) in self.pending.drain(..) {
            let members = self.members.entry(name).or_default();
            collect_members(element, members);
        }
    }

    /// name -> members, in discovery order without duplicates
    pub fn members(&self) -> &IndexMap<String, Vec<String>> {
        &self.members
    }
}

fn collect_members(node: &ElmNode, members: &mut Vec<String>) {
    if node.kind() == &NodeKind::ExpressionRef {
        if let Some(name) = node.name() {
            push_unique(members, name);
        }
    }

    for (field, value) in node.fields() {
        if field == ANNOTATION_FIELD {
            continue;
        }
        if field == "codes" {
            // Terminal: the value set or code the retrieve filters on
            if let Some(codes) = value.as_node() {
                let name = codes
                    .node("operand")
                    .and_then(ElmNode::name)
                    .or_else(|| codes.name());
                if let Some(name) = name {
                    push_unique(members, name);
                }
            }
            continue;
        }
        for child in value.nodes() {
            collect_members(child, members);
        }
    }
}

fn push_unique(members: &mut Vec<String>, name: &str) {
    if !members.iter().any(|m| m == name) {
        members.push(name.to_string());
    }
}
