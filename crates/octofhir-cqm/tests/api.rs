//! Library-level entry points

use octofhir_cqm::diagnostics::CQM0004;
use octofhir_cqm::{AttributeEngine, MeasureInput, annotate_str};
use serde_json::json;

fn measure() -> serde_json::Value {
    json!({
        "elm": [{
            "library": {
                "identifier": { "id": "Dx" },
                "valueSets": { "def": [{ "name": "Diabetes", "id": "1.2.3" }] },
                "statements": { "def": [{
                    "name": "Active Diabetes",
                    "localId": "4",
                    "expression": {
                        "type": "Query",
                        "source": [{
                            "alias": "D",
                            "expression": {
                                "type": "Retrieve",
                                "dataType": "{urn:healthit-gov:qdm:v5_3}PositiveDiagnosis",
                                "codes": { "type": "ValueSetRef", "name": "Diabetes" }
                            }
                        }],
                        "where": {
                            "type": "Overlaps",
                            "operand": [
                                { "type": "Property", "path": "prevalencePeriod", "scope": "D" },
                                { "type": "ParameterRef", "name": "Measurement Period" }
                            ]
                        }
                    }
                }] }
            }
        }],
        "cql_statement_dependencies": { "Dx": { "Active Diabetes": [] } },
        "source_data_criteria": {
            "DiagnosisDiabetes": { "description": "Diagnosis: Diabetes", "code_list_id": "1.2.3" }
        }
    })
}

#[test]
fn test_annotate_str() {
    let (measure, report) = annotate_str(&measure().to_string()).unwrap();

    assert_eq!(report.attached, 1);
    assert_eq!(
        measure.source_data_criteria["DiagnosisDiabetes"].attributes[0].attribute_name,
        "prevalencePeriod"
    );
}

#[test]
fn test_annotate_str_rejects_bad_documents() {
    let err = annotate_str("[]").unwrap_err();
    assert_eq!(err.code(), CQM0004);
}

#[test]
fn test_engine_matches_convenience_function() {
    let mut direct = MeasureInput::from_value(measure()).unwrap();
    AttributeEngine::qdm().annotate(&mut direct);
    let (convenient, _) = annotate_str(&measure().to_string()).unwrap();

    assert_eq!(direct.source_data_criteria, convenient.source_data_criteria);
}
