//! Tests for loading compiled ELM documents
//!
//! Covers:
//! - Envelope and bare library documents
//! - Translator variations (numeric local ids, single-node lists)
//! - Tree traversal helpers over loaded statements

use octofhir_cqm_diagnostics::{CQM0001, CQM0003, CQM0406, ErrorCode};
use octofhir_cqm_elm::{ElmDocument, ElmNode, ElmValue, NodeKind};
use pretty_assertions::assert_eq;
use rstest::rstest;

const DIABETES_ELM: &str = r#"{
  "library": {
    "annotation": [{ "translatorVersion": "1.3", "type": "CqlToElmInfo" }],
    "identifier": { "id": "DiabetesHbA1c", "version": "8.1.000" },
    "schemaIdentifier": { "id": "urn:hl7-org:elm", "version": "r1" },
    "valueSets": { "def": [
      { "name": "HbA1c Laboratory Test", "id": "2.16.840.1.113883.3.464.1003.198.12.1013", "accessLevel": "Public" },
      { "name": "Diabetes", "id": "2.16.840.1.113883.3.464.1003.103.12.1001", "accessLevel": "Public" }
    ] },
    "statements": { "def": [
      { "name": "Patient", "context": "Patient", "expression": { "type": "SingletonFrom" } },
      {
        "localId": 24,
        "name": "Most Recent HbA1c",
        "context": "Patient",
        "accessLevel": "Public",
        "expression": {
          "localId": "23",
          "type": "Last",
          "source": {
            "type": "Query",
            "source": [{
              "alias": "RecentHbA1c",
              "expression": {
                "dataType": "{urn:healthit-gov:qdm:v5_3}PositiveLaboratoryTestPerformed",
                "type": "Retrieve",
                "codes": { "name": "HbA1c Laboratory Test", "type": "ValueSetRef" }
              }
            }],
            "sort": { "by": [{ "direction": "asc", "type": "ByExpression" }] }
          }
        }
      }
    ] }
  }
}"#;

#[test]
fn test_load_realistic_library() {
    let doc = ElmDocument::from_json_str(DIABETES_ELM).unwrap();
    let lib = &doc.library;

    assert_eq!(lib.id(), "DiabetesHbA1c");
    assert_eq!(lib.identifier.version.as_deref(), Some("8.1.000"));
    assert_eq!(lib.terminology().count(), 2);

    let def = lib.statement("Most Recent HbA1c").unwrap();
    assert_eq!(def.local_id(), Some("24"));

    let expression = def.expression.as_ref().unwrap();
    assert_eq!(expression.kind(), &NodeKind::Last);
    assert!(expression.kind().is_first_or_last());

    let query = expression.node("source").unwrap();
    let retrieve = query.sources()[0].expression().unwrap();
    assert_eq!(query.sources()[0].alias(), Some("RecentHbA1c"));
    assert_eq!(retrieve.kind(), &NodeKind::Retrieve);
    assert_eq!(retrieve.codes_name(), Some("HbA1c Laboratory Test"));
}

#[test]
fn test_from_reader() {
    let doc = ElmDocument::from_reader(DIABETES_ELM.as_bytes()).unwrap();
    assert_eq!(doc.library.statements().len(), 2);
}

#[rstest]
#[case::not_json("{", CQM0406)]
#[case::empty_object("{}", CQM0001)]
#[case::statement_object(r#"{"library": {"identifier": {"id": "A"}, "statements": {"def": 3}}}"#, CQM0003)]
#[case::bad_value_set(r#"{"library": {"identifier": {"id": "A"}, "valueSets": {"def": [{"name": 1}]}}}"#, CQM0001)]
fn test_rejected_documents(#[case] input: &str, #[case] code: ErrorCode) {
    let err = ElmDocument::from_json_str(input).unwrap_err();
    assert_eq!(err.code(), code);
}

#[test]
fn test_builder_nodes() {
    let node = ElmNode::new(NodeKind::ExpressionRef)
        .with_field("name", ElmValue::Text("Qualifying Encounters".to_string()))
        .with_field("operand", ElmValue::List(vec![]));

    assert_eq!(node.name(), Some("Qualifying Encounters"));
    assert!(node.operands().is_empty());
    assert_eq!(node.children().count(), 0);
    assert_eq!(node.field("operand").and_then(ElmValue::as_list).map(<[ElmValue]>::len), Some(0));
}
