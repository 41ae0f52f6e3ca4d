//! Output formatting utilities

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use octofhir_cqm_diagnostics::CqmError;
use serde_json::Value;
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use tabled::{Table, Tabled, settings::Style};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON
    Json,
    /// Indented JSON
    #[value(alias = "json-pretty")]
    Pretty,
    /// Human-readable table
    Table,
}

/// Set up color output based on user preference
pub fn setup_colors(mode: &str) {
    match mode.to_lowercase().as_str() {
        "always" => colored::control::set_override(true),
        "never" => colored::control::set_override(false),
        _ => colored::control::set_override(io::stdout().is_terminal()),
    }
}

/// Format an error for display.
///
/// Engine errors are rendered as diagnostics with their code and help text.
pub fn format_error(error: &anyhow::Error) -> String {
    let mut out = format!("{} {:#}", "Error:".red().bold(), error);
    if let Some(cqm) = error.chain().find_map(|e| e.downcast_ref::<CqmError>()) {
        for diagnostic in cqm.diagnostics() {
            out.push('\n');
            out.push_str(&diagnostic.render());
        }
    }
    out
}

/// Format a warning for display
pub fn format_warning(warning: &str) -> String {
    format!("{} {}", "Warning:".yellow().bold(), warning)
}

/// Format a success message for display
pub fn format_success(message: &str) -> String {
    format!("{} {}", "Success:".green().bold(), message)
}

/// Write output to a file or stdout
pub fn write_output(content: &str, output_file: Option<&Path>) -> Result<()> {
    if let Some(path) = output_file {
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write to output file: {}", path.display()))?;
        eprintln!("{}", format_success(&format!("Output written to {}", path.display())));
    } else {
        println!("{}", content);
    }
    Ok(())
}

/// Format JSON value for output
pub fn format_json(value: &Value, pretty: bool) -> Result<String> {
    if pretty {
        serde_json::to_string_pretty(value).context("Failed to serialize JSON")
    } else {
        serde_json::to_string(value).context("Failed to serialize JSON")
    }
}

/// Render rows as a table, or a placeholder when there are none
pub fn format_table<T: Tabled>(rows: Vec<T>) -> String {
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows).with(Style::modern()).to_string()
}

/// Render `value` as JSON, or `rows` as a table
pub fn render<T: Tabled>(value: &Value, rows: impl FnOnce() -> Vec<T>, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => format_json(value, false),
        OutputFormat::Pretty => format_json(value, true),
        OutputFormat::Table => Ok(format_table(rows())),
    }
}

/// Format an optional cell
pub fn cell(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}
