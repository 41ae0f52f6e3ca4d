//! Statement classification
//!
//! Each relevant statement is matched against a fixed set of expression
//! shapes, first match wins. The match decides how the statement's name is
//! bound: straight to a value set, to another statement, to its own union
//! membership, or (for queries) to the list of sources it draws from.

use log::{debug, trace};
use octofhir_cqm_diagnostics::CQM0106;
use octofhir_cqm_elm::{ElmNode, ExpressionDef, NodeKind};
use serde::Serialize;

use crate::context::{Classification, ResolutionContext, RootBinding};

/// Expression shape a statement was recognized as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementShape {
    /// Retrieve with a `dataType`
    Retrieve,
    /// `First`/`Last` over a statement reference
    FirstOrLastOfReference,
    /// Bare statement reference
    Reference,
    /// `Except`, bound to its last operand
    Except,
    /// Query, or `First`/`Last` over a query
    Query,
    Union,
    Intersect,
    /// None of the above; contributes no bindings
    Unrecognized,
}

/// Classify one statement and record its bindings
pub fn classify_statement<'a>(
    ctx: &mut ResolutionContext<'a>,
    library: &str,
    def: &'a ExpressionDef,
) -> StatementShape {
    let shape = match &def.expression {
        Some(expression) => classify_expression(ctx, library, def, expression),
        None => StatementShape::Unrecognized,
    };
    if shape == StatementShape::Unrecognized {
        trace!("{}: {}.{} has no recognized shape", CQM0106, library, def.name);
    }

    ctx.classifications.push(Classification {
        library: library.to_string(),
        statement: def.name.clone(),
        shape,
    });
    shape
}

fn classify_expression<'a>(
    ctx: &mut ResolutionContext<'a>,
    library: &str,
    def: &'a ExpressionDef,
    expression: &'a ElmNode,
) -> StatementShape {
    let name = def.name.as_str();
    let kind = expression.kind();
    let single_source = expression.node("source");

    if expression.data_type().is_some() {
        if let Some(value_set) = expression.codes_name() {
            ctx.bind_root(name, RootBinding::Name(value_set.to_string()));
        }
        return StatementShape::Retrieve;
    }

    if kind.is_first_or_last() {
        if let Some(source) = single_source.filter(|s| s.kind() == &NodeKind::ExpressionRef) {
            if let Some(target) = source.name() {
                ctx.bind_root(name, RootBinding::Name(target.to_string()));
            }
            return StatementShape::FirstOrLastOfReference;
        }
    }

    match kind {
        NodeKind::ExpressionRef => {
            if let Some(target) = expression.name() {
                ctx.bind_root(name, RootBinding::Name(target.to_string()));
            }
            StatementShape::Reference
        }
        NodeKind::Except => {
            // Every operand overwrites the binding; the last one stands
            match expression.operands().last().and_then(|op| op.name()) {
                Some(target) => ctx.bind_root(name, RootBinding::Name(target.to_string())),
                None => debug!("{}.{}: last Except operand has no name", library, name),
            }
            StatementShape::Except
        }
        NodeKind::Query => {
            classify_query(ctx, library, def, expression, expression);
            StatementShape::Query
        }
        NodeKind::First | NodeKind::Last
            if single_source.is_some_and(|s| s.kind() == &NodeKind::Query) =>
        {
            if let Some(query) = single_source {
                classify_query(ctx, library, def, expression, query);
            }
            StatementShape::Query
        }
        NodeKind::Union | NodeKind::Intersect => {
            classify_set_operation(ctx, library, def, expression);
            if kind == &NodeKind::Union {
                StatementShape::Union
            } else {
                StatementShape::Intersect
            }
        }
        _ => StatementShape::Unrecognized,
    }
}

fn classify_query<'a>(
    ctx: &mut ResolutionContext<'a>,
    library: &str,
    def: &'a ExpressionDef,
    statement_root: &'a ElmNode,
    query: &'a ElmNode,
) {
    let name = def.name.as_str();
    let mut sources = Vec::new();

    for source in query.sources() {
        classify_query_source(ctx, library, def, statement_root, source, &mut sources);
    }
    if !sources.is_empty() {
        ctx.record_statement_sources(library, name, &sources);
    }

    for relationship in query.relationships() {
        let Some(expression) = relationship.expression() else {
            continue;
        };
        if expression.data_type().is_some() {
            if let Some(value_set) = expression.codes_name() {
                ctx.bind_root(value_set, RootBinding::Name(value_set.to_string()));
            }
        }
    }

    if !ctx.root.contains_key(name) {
        ctx.bind_non_root(name, sources);
    }
}

fn classify_query_source<'a>(
    ctx: &mut ResolutionContext<'a>,
    library: &str,
    def: &'a ExpressionDef,
    statement_root: &'a ElmNode,
    source: &'a ElmNode,
    sources: &mut Vec<String>,
) {
    let name = def.name.as_str();
    let Some(expression) = source.expression() else {
        return;
    };

    if let Some(alias) = source.alias() {
        if let Some(target) = expression.name() {
            ctx.record_alias_source(library, def.local_id(), alias, target);
            sources.push(target.to_string());
        } else if expression.kind() == &NodeKind::Union {
            ctx.bind_root(alias, RootBinding::Name(alias.to_string()));
            ctx.unions.register(alias, source);
        }
    }

    let binding = if expression.data_type().is_some() {
        expression.codes_name()
    } else {
        match expression.kind() {
            NodeKind::Union => {
                ctx.bind_root(name, RootBinding::Name(name.to_string()));
                ctx.unions.register(name, statement_root);
                None
            }
            NodeKind::Query => expression
                .sources()
                .first()
                .and_then(|s| s.expression())
                .and_then(ElmNode::codes_name),
            NodeKind::ExpressionRef => expression.name(),
            NodeKind::Last => expression
                .node("source")
                .and_then(|q| q.sources().first().copied())
                .and_then(|s| s.expression())
                .and_then(ElmNode::codes_name),
            _ => None,
        }
    };

    if let Some(target) = binding {
        ctx.bind_root(name, RootBinding::Name(target.to_string()));
    }
}

fn classify_set_operation<'a>(
    ctx: &mut ResolutionContext<'a>,
    library: &str,
    def: &'a ExpressionDef,
    expression: &'a ElmNode,
) {
    let name = def.name.as_str();
    let mut sources = Vec::new();

    for operand in expression.operands() {
        if operand.has_field("source") {
            for source in operand.sources() {
                let target = source.expression().and_then(ElmNode::name);
                if let (Some(alias), Some(target)) = (source.alias(), target) {
                    ctx.record_alias_source(library, def.local_id(), alias, target);
                    sources.push(target.to_string());
                }
            }
        } else if let Some(value_set) = operand.codes().and_then(ElmNode::name) {
            sources.push(value_set.to_string());
        }
    }

    if expression.kind() == &NodeKind::Union {
        ctx.unions.register(name, expression);
    }
    ctx.record_statement_sources(library, name, &sources);
    ctx.bind_root(name, RootBinding::Name(name.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use octofhir_cqm_elm::ElmDocument;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn statement(expression: Value) -> ElmDocument {
        ElmDocument::from_value(json!({
            "library": {
                "identifier": { "id": "Main" },
                "statements": { "def": [{ "name": "S", "localId": "1", "expression": expression }] }
            }
        }))
        .unwrap()
    }

    fn classify(doc: &ElmDocument) -> (ResolutionContext<'_>, StatementShape) {
        let mut ctx = ResolutionContext::default();
        let shape = classify_statement(&mut ctx, "Main", &doc.library.statements()[0]);
        (ctx, shape)
    }

    fn retrieve(value_set: &str) -> Value {
        json!({
            "type": "Retrieve",
            "dataType": "{urn:healthit-gov:qdm:v5_3}PositiveEncounterPerformed",
            "codes": { "type": "ValueSetRef", "name": value_set }
        })
    }

    #[rstest]
    #[case::retrieve(retrieve("Inpatient"), StatementShape::Retrieve, "Inpatient")]
    #[case::code_retrieve(
        json!({ "type": "Retrieve", "dataType": "X", "codes": { "type": "ToList", "operand": { "type": "CodeRef", "name": "Dead" } } }),
        StatementShape::Retrieve,
        "Dead"
    )]
    #[case::reference(json!({ "type": "ExpressionRef", "name": "Other" }), StatementShape::Reference, "Other")]
    #[case::first_of_reference(
        json!({ "type": "First", "source": { "type": "ExpressionRef", "name": "Encounters" } }),
        StatementShape::FirstOrLastOfReference,
        "Encounters"
    )]
    #[case::except(
        json!({ "type": "Except", "operand": [{ "type": "ExpressionRef", "name": "A" }, { "type": "ExpressionRef", "name": "B" }] }),
        StatementShape::Except,
        "B"
    )]
    fn test_direct_bindings(#[case] expression: Value, #[case] shape: StatementShape, #[case] target: &str) {
        let doc = statement(expression);
        let (ctx, found) = classify(&doc);

        assert_eq!(found, shape);
        assert_eq!(ctx.root_criteria()["S"], RootBinding::Name(target.to_string()));
    }

    #[test]
    fn test_except_without_named_last_operand() {
        let doc = statement(json!({
            "type": "Except",
            "operand": [{ "type": "ExpressionRef", "name": "A" }, retrieve("Inpatient")]
        }));
        let (ctx, shape) = classify(&doc);

        assert_eq!(shape, StatementShape::Except);
        assert!(!ctx.root_criteria().contains_key("S"));
    }

    #[test]
    fn test_query_over_reference_is_non_root() {
        let doc = statement(json!({
            "type": "Query",
            "source": [{ "alias": "E", "expression": { "type": "ExpressionRef", "name": "Inpatient Encounter" } }],
            "relationship": [{ "type": "With", "alias": "L", "expression": retrieve("HbA1c") }]
        }));
        let (ctx, shape) = classify(&doc);

        assert_eq!(shape, StatementShape::Query);
        // The reference branch binds the statement as root as well
        assert_eq!(ctx.root_criteria()["S"], RootBinding::Name("Inpatient Encounter".into()));
        assert_eq!(ctx.root_criteria()["HbA1c"], RootBinding::Name("HbA1c".into()));
        assert_eq!(ctx.alias_sources()["Main"]["1"]["E"], "Inpatient Encounter");
        assert_eq!(ctx.statement_sources()["Main"]["S"], vec!["Inpatient Encounter"]);
        assert!(!ctx.non_root_criteria().contains_key("S"));
    }

    #[test]
    fn test_query_over_function_result_is_non_root() {
        let doc = statement(json!({
            "type": "Query",
            "source": [
                { "alias": "E", "expression": { "type": "FunctionRef", "name": "Normalize Encounters" } },
                { "alias": "F", "expression": { "type": "FunctionRef", "name": "Normalize Encounters" } }
            ]
        }));
        let (ctx, _) = classify(&doc);

        assert!(!ctx.root_criteria().contains_key("S"));
        assert_eq!(
            ctx.non_root_criteria()["S"],
            vec!["Normalize Encounters", "Normalize Encounters"]
        );
        assert_eq!(ctx.statement_sources()["Main"]["S"], vec!["Normalize Encounters"]);
    }

    #[test]
    fn test_last_over_query() {
        let doc = statement(json!({
            "type": "Last",
            "source": {
                "type": "Query",
                "source": [{ "alias": "R", "expression": retrieve("Inpatient") }]
            }
        }));
        let (ctx, shape) = classify(&doc);

        assert_eq!(shape, StatementShape::Query);
        assert_eq!(ctx.root_criteria()["S"], RootBinding::Name("Inpatient".into()));
    }

    #[test]
    fn test_query_over_union_source() {
        let doc = statement(json!({
            "type": "Query",
            "source": [{
                "alias": "U",
                "expression": {
                    "type": "Union",
                    "operand": [{ "type": "ExpressionRef", "name": "A" }, { "type": "ExpressionRef", "name": "B" }]
                }
            }]
        }));
        let (mut ctx, _) = classify(&doc);
        ctx.flatten_unions();

        assert_eq!(ctx.root_criteria()["U"], RootBinding::Members(vec!["A".into(), "B".into()]));
        assert_eq!(ctx.root_criteria()["S"], RootBinding::Members(vec!["A".into(), "B".into()]));
    }

    #[test]
    fn test_union_statement() {
        let doc = statement(json!({
            "type": "Union",
            "operand": [
                { "type": "Query", "source": [{ "alias": "A", "expression": { "type": "ExpressionRef", "name": "Inpatient Encounter" } }] },
                retrieve("Observation")
            ]
        }));
        let (mut ctx, shape) = classify(&doc);

        assert_eq!(shape, StatementShape::Union);
        assert_eq!(ctx.root_criteria()["S"], RootBinding::Name("S".into()));
        assert_eq!(
            ctx.statement_sources()["Main"]["S"],
            vec!["Inpatient Encounter", "Observation"]
        );

        ctx.flatten_unions();
        assert_eq!(
            ctx.root_criteria()["S"],
            RootBinding::Members(vec!["Inpatient Encounter".into(), "Observation".into()])
        );
    }

    #[test]
    fn test_intersect_stays_self_bound() {
        let doc = statement(json!({
            "type": "Intersect",
            "operand": [retrieve("Inpatient"), retrieve("Observation")]
        }));
        let (mut ctx, shape) = classify(&doc);
        ctx.flatten_unions();

        assert_eq!(shape, StatementShape::Intersect);
        assert_eq!(ctx.root_criteria()["S"], RootBinding::Name("S".into()));
    }

    #[rstest]
    #[case(json!({ "type": "Equal", "operand": [] }))]
    #[case(json!({ "type": "FunctionRef", "name": "F" }))]
    fn test_unrecognized(#[case] expression: Value) {
        let doc = statement(expression);
        let (ctx, shape) = classify(&doc);

        assert_eq!(shape, StatementShape::Unrecognized);
        assert!(ctx.root_criteria().is_empty());
        assert_eq!(ctx.classifications().len(), 1);
    }
}
