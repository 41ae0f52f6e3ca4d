//! Command round trips through files

#![cfg(feature = "cli")]

use octofhir_cqm::cli::annotate::{AnnotateConfig, annotate};
use octofhir_cqm::cli::complexity::{ComplexityConfig, complexity};
use octofhir_cqm::cli::inspect::{InspectConfig, inspect};
use octofhir_cqm::cli::output::OutputFormat;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const INPATIENT: &str = "2.16.840.1.113883.3.666.5.307";
const HOME: &str = "2.16.840.1.113883.3.117.1.7.1.87";

fn measure_json() -> Value {
    json!({
        "elm": [{
            "library": {
                "identifier": { "id": "Stays", "version": "1.0.0" },
                "valueSets": { "def": [
                    { "name": "Inpatient", "id": INPATIENT },
                    { "name": "Discharged to Home", "id": HOME }
                ] },
                "statements": { "def": [
                    {
                        "name": "Inpatient Encounter",
                        "localId": "1",
                        "expression": {
                            "type": "Retrieve",
                            "dataType": "{urn:healthit-gov:qdm:v5_3}PositiveEncounterPerformed",
                            "codes": { "type": "ValueSetRef", "name": "Inpatient" }
                        }
                    },
                    {
                        "name": "Discharged Home",
                        "localId": "2",
                        "expression": {
                            "type": "Query",
                            "source": [{ "alias": "E", "expression": { "type": "ExpressionRef", "name": "Inpatient Encounter" } }],
                            "where": {
                                "type": "And",
                                "operand": [
                                    {
                                        "type": "InValueSet",
                                        "code": { "type": "Property", "path": "dischargeDisposition", "scope": "E" },
                                        "valueset": { "name": "Discharged to Home" }
                                    },
                                    {
                                        "type": "In",
                                        "operand": [
                                            { "type": "Property", "path": "relevantPeriod", "scope": "E" },
                                            { "type": "ParameterRef", "name": "Measurement Period" }
                                        ]
                                    }
                                ]
                            }
                        }
                    }
                ] }
            }
        }],
        "cql_statement_dependencies": {
            "Stays": { "Discharged Home": [{ "library_name": "Stays", "statement_name": "Inpatient Encounter" }] }
        },
        "source_data_criteria": {
            "EncounterPerformedInpatient": {
                "title": "Inpatient",
                "description": "Encounter, Performed: Inpatient",
                "code_list_id": INPATIENT
            }
        }
    })
}

fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
    path
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn annotate_config(file: PathBuf, output: PathBuf) -> AnnotateConfig {
    AnnotateConfig {
        file,
        catalog: None,
        negation_marker: None,
        verbose: false,
        output_format: OutputFormat::Json,
        output_file: Some(output),
    }
}

#[test]
fn test_annotate_writes_criteria() {
    let dir = TempDir::new().unwrap();
    let input = write_json(dir.path(), "measure.json", &measure_json());
    let output = dir.path().join("criteria.json");

    let report = annotate(annotate_config(input, output.clone())).unwrap();
    assert_eq!(report.attached, 2);

    let criteria = read_json(&output);
    let criterion = &criteria["EncounterPerformedInpatient"];
    assert_eq!(criterion["title"], json!("Inpatient"));
    assert_eq!(
        criterion["attributes"],
        json!([
            { "attribute_name": "dischargeDisposition", "attribute_valueset": HOME },
            { "attribute_name": "relevantPeriod", "attribute_valueset": null }
        ])
    );
}

#[test]
fn test_annotate_with_catalog_and_marker() {
    let dir = TempDir::new().unwrap();
    let input = write_json(dir.path(), "measure.json", &measure_json());
    let catalog = write_json(
        dir.path(),
        "catalog.json",
        &json!({ "EncounterPerformed": ["relevantPeriod"] }),
    );
    let output = dir.path().join("criteria.json");

    let mut config = annotate_config(input, output.clone());
    config.catalog = Some(catalog);
    config.negation_marker = Some("Negated".to_string());
    annotate(config).unwrap();

    assert_eq!(
        read_json(&output)["EncounterPerformedInpatient"]["attributes"],
        json!([{ "attribute_name": "relevantPeriod", "attribute_valueset": null }])
    );
}

#[rstest]
#[case::missing_file(None)]
#[case::malformed_measure(Some(json!({ "elm": {} })))]
fn test_annotate_errors(#[case] content: Option<Value>) {
    let dir = TempDir::new().unwrap();
    let input = match content {
        Some(value) => write_json(dir.path(), "measure.json", &value),
        None => dir.path().join("missing.json"),
    };

    let err = annotate(annotate_config(input, dir.path().join("out.json"))).unwrap_err();
    assert!(err.to_string().contains("measure"));
}

#[test]
fn test_inspect_reports_tables() {
    let dir = TempDir::new().unwrap();
    let input = write_json(dir.path(), "measure.json", &measure_json());
    let output = dir.path().join("inspect.json");

    let report = inspect(InspectConfig {
        file: input,
        output_format: OutputFormat::Pretty,
        output_file: Some(output.clone()),
    })
    .unwrap();
    assert_eq!(report.triples.len(), 2);

    let value = read_json(&output);
    assert_eq!(value["root_criteria"]["Inpatient Encounter"], json!("Inpatient"));
    assert_eq!(value["resolved_value_sets"]["Discharged Home"], json!([INPATIENT]));
}

#[test]
fn test_inspect_table() {
    let dir = TempDir::new().unwrap();
    let input = write_json(dir.path(), "measure.json", &measure_json());
    let output = dir.path().join("inspect.txt");

    inspect(InspectConfig {
        file: input,
        output_format: OutputFormat::Table,
        output_file: Some(output.clone()),
    })
    .unwrap();

    let table = fs::read_to_string(&output).unwrap();
    assert!(table.contains("dischargeDisposition"));
    assert!(table.contains(INPATIENT));
}

#[test]
fn test_complexity() {
    let dir = TempDir::new().unwrap();
    let input = write_json(dir.path(), "measure.json", &measure_json());
    let output = dir.path().join("complexity.json");

    let statements = complexity(ComplexityConfig {
        file: input,
        output_format: OutputFormat::Json,
        output_file: Some(output.clone()),
    })
    .unwrap();

    let counts: Vec<usize> = statements.iter().map(|s| s.complexity).collect();
    assert_eq!(counts, vec![1, 2]);
    assert_eq!(read_json(&output)[1]["statement"], json!("Discharged Home"));
}
