//! Complexity command implementation

use super::output::{self, OutputFormat};
use anyhow::{Context, Result};
use octofhir_cqm_criteria::{StatementComplexity, statement_complexity};
use std::path::PathBuf;
use tabled::Tabled;

/// Configuration for complexity command
pub struct ComplexityConfig {
    pub file: PathBuf,
    pub output_format: OutputFormat,
    pub output_file: Option<PathBuf>,
}

#[derive(Tabled)]
struct ComplexityRow {
    #[tabled(rename = "Library")]
    library: String,
    #[tabled(rename = "Statement")]
    statement: String,
    #[tabled(rename = "Complexity")]
    complexity: usize,
}

/// Write the branch count of every statement of a measure
pub fn complexity(config: ComplexityConfig) -> Result<Vec<StatementComplexity>> {
    let measure = super::load_measure(&config.file)?;
    let statements = statement_complexity(&measure.libraries);

    let value = serde_json::to_value(&statements).context("Failed to serialize complexity")?;
    let rows = || {
        statements
            .iter()
            .map(|s| ComplexityRow {
                library: s.library.clone(),
                statement: s.statement.clone(),
                complexity: s.complexity,
            })
            .collect::<Vec<_>>()
    };
    let content = output::render(&value, rows, config.output_format)?;
    output::write_output(&content, config.output_file.as_deref())?;

    Ok(statements)
}
