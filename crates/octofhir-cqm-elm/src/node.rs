//! Lenient ELM expression nodes
//!
//! Compiled measure logic arrives as JSON whose node shapes vary with the
//! `type` discriminator and with the compiler version that produced it.
//! Rather than rejecting shapes it does not know, this module keeps every
//! node as a [`NodeKind`] plus its ordered fields, and exposes typed
//! accessors for the fields the attribute engine reads (`alias`, `scope`,
//! `path`, `operand`, `source`, `codes`, ...).

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;
use std::iter;

/// Field holding editor annotations; never part of the logic tree
pub const ANNOTATION_FIELD: &str = "annotation";

/// Discriminator of an ELM node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Property,
    ExpressionRef,
    FunctionRef,
    AliasRef,
    Query,
    Retrieve,
    Union,
    Intersect,
    Except,
    First,
    Last,
    Equivalent,
    Equal,
    InValueSet,
    And,
    Or,
    Not,
    ValueSetRef,
    CodeRef,
    With,
    Without,
    /// Any other `type` value
    Other(String),
    /// Object without a `type` member (query sources, clauses)
    Untyped,
}

impl NodeKind {
    /// Map a `type` discriminator to a node kind
    pub fn from_type(ty: &str) -> Self {
        match ty {
            "Property" => Self::Property,
            "ExpressionRef" => Self::ExpressionRef,
            "FunctionRef" => Self::FunctionRef,
            "AliasRef" => Self::AliasRef,
            "Query" => Self::Query,
            "Retrieve" => Self::Retrieve,
            "Union" => Self::Union,
            "Intersect" => Self::Intersect,
            "Except" => Self::Except,
            "First" => Self::First,
            "Last" => Self::Last,
            "Equivalent" => Self::Equivalent,
            "Equal" => Self::Equal,
            "InValueSet" => Self::InValueSet,
            "And" => Self::And,
            "Or" => Self::Or,
            "Not" => Self::Not,
            "ValueSetRef" => Self::ValueSetRef,
            "CodeRef" => Self::CodeRef,
            "With" => Self::With,
            "Without" => Self::Without,
            other => Self::Other(other.to_string()),
        }
    }

    /// The discriminator string, if the node had one
    pub fn as_str(&self) -> Option<&str> {
        Some(match self {
            Self::Property => "Property",
            Self::ExpressionRef => "ExpressionRef",
            Self::FunctionRef => "FunctionRef",
            Self::AliasRef => "AliasRef",
            Self::Query => "Query",
            Self::Retrieve => "Retrieve",
            Self::Union => "Union",
            Self::Intersect => "Intersect",
            Self::Except => "Except",
            Self::First => "First",
            Self::Last => "Last",
            Self::Equivalent => "Equivalent",
            Self::Equal => "Equal",
            Self::InValueSet => "InValueSet",
            Self::And => "And",
            Self::Or => "Or",
            Self::Not => "Not",
            Self::ValueSetRef => "ValueSetRef",
            Self::CodeRef => "CodeRef",
            Self::With => "With",
            Self::Without => "Without",
            Self::Other(ty) => ty.as_str(),
            Self::Untyped => return None,
        })
    }

    /// `First` or `Last`
    pub fn is_first_or_last(&self) -> bool {
        matches!(self, Self::First | Self::Last)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("<untyped>"))
    }
}

/// A field value inside an ELM node
#[derive(Debug, Clone, PartialEq)]
pub enum ElmValue {
    Node(ElmNode),
    List(Vec<ElmValue>),
    Text(String),
    /// Numbers, booleans and nulls
    Scalar(Value),
}

impl ElmValue {
    /// Convert a raw JSON value
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Node(ElmNode::from_json_object(map)),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            Value::String(s) => Self::Text(s),
            other => Self::Scalar(other),
        }
    }

    pub fn as_node(&self) -> Option<&ElmNode> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ElmValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Nodes held by this value: itself if a node, the node items if a list
    pub fn nodes(&self) -> Vec<&ElmNode> {
        match self {
            Self::Node(node) => vec![node],
            Self::List(items) => items.iter().filter_map(Self::as_node).collect(),
            _ => Vec::new(),
        }
    }
}

/// An ELM node: its discriminator and its fields in document order
#[derive(Debug, Clone, PartialEq)]
pub struct ElmNode {
    kind: NodeKind,
    fields: IndexMap<String, ElmValue>,
}

impl ElmNode {
    /// Create an empty node of the given kind
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            fields: IndexMap::new(),
        }
    }

    /// Build a node from a JSON object; a string `type` member becomes the kind
    pub fn from_json_object(map: Map<String, Value>) -> Self {
        let kind = match map.get("type") {
            Some(Value::String(ty)) => NodeKind::from_type(ty),
            _ => NodeKind::Untyped,
        };
        let typed = kind != NodeKind::Untyped;
        // `Map::remove` would swap the last field into the `type` slot
        let fields = map
            .into_iter()
            .filter(|(name, _)| !(typed && name == "type"))
            .map(|(name, value)| (name, ElmValue::from_json(value)))
            .collect();
        Self { kind, fields }
    }

    /// Add a field, builder style
    pub fn with_field(mut self, name: impl Into<String>, value: ElmValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn field(&self, name: &str) -> Option<&ElmValue> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// All fields in document order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &ElmValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// A field holding a single node
    pub fn node(&self, name: &str) -> Option<&ElmNode> {
        self.field(name).and_then(ElmValue::as_node)
    }

    /// A field holding a string
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(ElmValue::as_text)
    }

    /// A field holding either a node or a list of nodes
    pub fn nodes(&self, name: &str) -> Vec<&ElmNode> {
        self.field(name).map(ElmValue::nodes).unwrap_or_default()
    }

    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    pub fn alias(&self) -> Option<&str> {
        self.text("alias")
    }

    pub fn scope(&self) -> Option<&str> {
        self.text("scope")
    }

    pub fn path(&self) -> Option<&str> {
        self.text("path")
    }

    pub fn data_type(&self) -> Option<&str> {
        self.text("dataType")
    }

    /// Operands, whether stored as one node or as a list
    pub fn operands(&self) -> Vec<&ElmNode> {
        self.nodes("operand")
    }

    /// Query sources
    pub fn sources(&self) -> Vec<&ElmNode> {
        self.nodes("source")
    }

    /// Query relationship clauses (`with` / `without`)
    pub fn relationships(&self) -> Vec<&ElmNode> {
        self.nodes("relationship")
    }

    /// The `expression` child, as found on query sources and relationship clauses
    pub fn expression(&self) -> Option<&ElmNode> {
        self.node("expression")
    }

    pub fn where_clause(&self) -> Option<&ElmNode> {
        self.node("where")
    }

    pub fn codes(&self) -> Option<&ElmNode> {
        self.node("codes")
    }

    /// Value set or code name bound through `codes`, looking through one operand
    pub fn codes_name(&self) -> Option<&str> {
        let codes = self.codes()?;
        codes
            .name()
            .or_else(|| codes.node("operand").and_then(ElmNode::name))
    }

    /// Name of the `valueset` reference, as carried by `InValueSet` and filters
    pub fn valueset_name(&self) -> Option<&str> {
        self.node("valueset").and_then(ElmNode::name)
    }

    /// Name carried by the second operand, e.g. the code side of `Equivalent`
    pub fn second_operand_name(&self) -> Option<&str> {
        self.operands().get(1).and_then(|op| op.name())
    }

    /// Child nodes in document order, paired with the field that holds them.
    ///
    /// List fields yield each node item under the list's field name;
    /// annotations are skipped.
    pub fn children(&self) -> impl Iterator<Item = (&str, &ElmNode)> {
        self.fields
            .iter()
            .filter(|(name, _)| name.as_str() != ANNOTATION_FIELD)
            .flat_map(|(name, value)| {
                let nodes: Box<dyn Iterator<Item = &ElmNode> + '_> = match value {
                    ElmValue::Node(node) => Box::new(iter::once(node)),
                    ElmValue::List(items) => Box::new(items.iter().filter_map(ElmValue::as_node)),
                    _ => Box::new(iter::empty()),
                };
                nodes.map(move |node| (name.as_str(), node))
            })
    }
}

impl<'de> Deserialize<'de> for ElmNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self::from_json_object(map))
    }
}

impl From<Map<String, Value>> for ElmNode {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_json_object(map)
    }
}
