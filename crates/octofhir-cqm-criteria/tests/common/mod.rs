//! Shared ELM and measure fixtures

#![allow(dead_code)]

use octofhir_cqm_criteria::MeasureInput;
use serde_json::{Value, json};

pub const INPATIENT: &str = "2.16.840.1.113883.3.666.5.307";
pub const OBSERVATION: &str = "2.16.840.1.113762.1.4.1111.143";
pub const DIABETES: &str = "2.16.840.1.113883.3.464.1003.103.12.1001";
pub const SEVERE: &str = "2.16.840.1.113883.3.464.1003.111.12.1001";
pub const DISCHARGED_HOME: &str = "2.16.840.1.113883.3.117.1.7.1.87";

pub fn retrieve(datatype: &str, value_set: &str) -> Value {
    json!({
        "type": "Retrieve",
        "dataType": format!("{{urn:healthit-gov:qdm:v5_3}}{}", datatype),
        "codes": { "type": "ValueSetRef", "name": value_set }
    })
}

pub fn expression_ref(name: &str) -> Value {
    json!({ "type": "ExpressionRef", "name": name })
}

pub fn property(path: &str, scope: &str) -> Value {
    json!({ "type": "Property", "path": path, "scope": scope })
}

pub fn in_value_set(code: Value, value_set: &str) -> Value {
    json!({ "type": "InValueSet", "code": code, "valueset": { "type": "ValueSetRef", "name": value_set } })
}

pub fn query(alias: &str, source: Value, where_clause: Option<Value>) -> Value {
    let mut query = json!({
        "type": "Query",
        "source": [{ "alias": alias, "expression": source }]
    });
    if let Some(where_clause) = where_clause {
        query["where"] = where_clause;
    }
    query
}

pub fn statement(name: &str, local_id: &str, expression: Value) -> Value {
    json!({ "name": name, "localId": local_id, "context": "Patient", "expression": expression })
}

pub fn library(id: &str, value_sets: &[(&str, &str)], statements: Vec<Value>) -> Value {
    let value_sets: Vec<Value> = value_sets
        .iter()
        .map(|(name, id)| json!({ "name": name, "id": id }))
        .collect();
    json!({
        "library": {
            "identifier": { "id": id, "version": "1.0.0" },
            "valueSets": { "def": value_sets },
            "statements": { "def": statements }
        }
    })
}

/// Dependency map listing `statements` of `library`, with no edges
pub fn dependencies(library: &str, statements: &[&str]) -> Value {
    let entries: serde_json::Map<String, Value> = statements
        .iter()
        .map(|name| (name.to_string(), json!([])))
        .collect();
    let mut map = serde_json::Map::new();
    map.insert(library.to_string(), Value::Object(entries));
    Value::Object(map)
}

pub fn criterion(description: &str, code_list_id: &str) -> Value {
    json!({ "description": description, "code_list_id": code_list_id, "attributes": [] })
}

pub fn measure(elm: Vec<Value>, dependencies: Value, criteria: Value) -> MeasureInput {
    MeasureInput::from_value(json!({
        "elm": elm,
        "cql_statement_dependencies": dependencies,
        "source_data_criteria": criteria
    }))
    .expect("fixture measure is well formed")
}

/// `(attribute_name, attribute_valueset)` pairs attached to a criterion
pub fn attributes(measure: &MeasureInput, key: &str) -> Vec<(String, Option<String>)> {
    measure.source_data_criteria[key]
        .attributes
        .iter()
        .map(|a| (a.attribute_name.clone(), a.attribute_valueset.clone()))
        .collect()
}

pub fn attr(name: &str, value_set: Option<&str>) -> (String, Option<String>) {
    (name.to_string(), value_set.map(str::to_string))
}
