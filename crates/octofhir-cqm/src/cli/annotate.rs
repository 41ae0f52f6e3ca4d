//! Annotate command implementation

use super::output::{self, OutputFormat};
use anyhow::{Context, Result};
use colored::Colorize;
use octofhir_cqm_criteria::{AnnotationReport, AttributeEngine, EngineConfig, MeasureInput};
use std::path::PathBuf;
use tabled::Tabled;

/// Configuration for annotate command
pub struct AnnotateConfig {
    pub file: PathBuf,
    pub catalog: Option<PathBuf>,
    pub negation_marker: Option<String>,
    pub verbose: bool,
    pub output_format: OutputFormat,
    pub output_file: Option<PathBuf>,
}

#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Criterion")]
    criterion: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Attribute")]
    attribute: String,
    #[tabled(rename = "Value Set")]
    value_set: String,
}

/// Annotate the source data criteria of a measure and write them out
pub fn annotate(config: AnnotateConfig) -> Result<AnnotationReport> {
    let mut measure = super::load_measure(&config.file)?;
    let catalog = super::load_catalog(config.catalog.as_deref())?;

    let mut engine_config = EngineConfig::default();
    if let Some(marker) = config.negation_marker {
        engine_config = engine_config.with_negation_marker(marker);
    }
    let engine = AttributeEngine::new(catalog).with_config(engine_config);
    let report = engine.annotate(&mut measure);

    let value = measure
        .source_data_criteria_json()
        .context("Failed to serialize source data criteria")?;
    let content = output::render(&value, || attribute_rows(&measure), config.output_format)?;
    output::write_output(&content, config.output_file.as_deref())?;

    if config.verbose {
        print_report(&report);
    }
    if report.unresolved > 0 {
        eprintln!(
            "{}",
            output::format_warning(&format!(
                "{} attribute access(es) did not resolve to a value set",
                report.unresolved
            ))
        );
    }

    Ok(report)
}

fn attribute_rows(measure: &MeasureInput) -> Vec<AttributeRow> {
    measure
        .source_data_criteria
        .iter()
        .flat_map(|(key, criterion)| {
            criterion.attributes.iter().map(move |attribute| AttributeRow {
                criterion: key.clone(),
                description: criterion.description.clone(),
                attribute: attribute.attribute_name.clone(),
                value_set: output::cell(attribute.attribute_valueset.as_deref()),
            })
        })
        .collect()
}

fn print_report(report: &AnnotationReport) {
    eprintln!(
        "{} {} accesses, {} attached, {} skipped, {} unresolved",
        "Summary:".bold(),
        report.triples,
        report.attached,
        report.skipped.len(),
        report.unresolved
    );
    for diagnostic in report.diagnostics() {
        eprintln!("{}", diagnostic.render());
    }
}
