//! Inspect command implementation

use super::output::{self, OutputFormat};
use anyhow::{Context, Result};
use octofhir_cqm_criteria::{AnalysisReport, AttributeEngine};
use std::path::PathBuf;
use tabled::Tabled;

/// Configuration for inspect command
pub struct InspectConfig {
    pub file: PathBuf,
    pub output_format: OutputFormat,
    pub output_file: Option<PathBuf>,
}

#[derive(Tabled)]
struct TripleRow {
    #[tabled(rename = "Statement")]
    statement: String,
    #[tabled(rename = "Attribute")]
    attribute: String,
    #[tabled(rename = "Criteria")]
    criteria: String,
    #[tabled(rename = "Value Set")]
    value_set: String,
    #[tabled(rename = "Resolves To")]
    resolves_to: String,
}

/// Write the resolution tables and attribute accesses of a measure
pub fn inspect(config: InspectConfig) -> Result<AnalysisReport> {
    let measure = super::load_measure(&config.file)?;
    let report = AttributeEngine::qdm()
        .analyze(&measure.libraries, &measure.dependencies)
        .report();

    let value = serde_json::to_value(&report).context("Failed to serialize analysis")?;
    let content = output::render(&value, || triple_rows(&report), config.output_format)?;
    output::write_output(&content, config.output_file.as_deref())?;

    Ok(report)
}

fn triple_rows(report: &AnalysisReport) -> Vec<TripleRow> {
    report
        .triples
        .iter()
        .map(|triple| TripleRow {
            statement: format!("{}.{}", triple.library, triple.statement),
            attribute: triple.attribute.clone(),
            criteria: triple.criteria.clone(),
            value_set: output::cell(triple.value_set.as_deref()),
            resolves_to: report
                .resolved_value_sets
                .get(&triple.criteria)
                .map(|ids| ids.join(", "))
                .unwrap_or_else(|| report.value_sets.id(&triple.criteria).unwrap_or("-").to_string()),
        })
        .collect()
}
