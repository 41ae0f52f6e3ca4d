//! CLI functionality for the CQM tool
//!
//! This module contains all CLI-related functionality including:
//! - Annotation of source data criteria
//! - Inspection of the resolution tables
//! - Statement complexity
//! - Output formatting

pub mod annotate;
pub mod complexity;
pub mod inspect;
pub mod output;

use anyhow::{Context, Result};
use octofhir_cqm_criteria::{AttributeCatalog, MeasureInput};
use std::fs;
use std::path::Path;

/// Read and parse a measure document
pub fn load_measure(path: &Path) -> Result<MeasureInput> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read measure file: {}", path.display()))?;
    MeasureInput::from_json_str(&content)
        .map_err(|e| e.with_context(path.display().to_string()))
        .with_context(|| format!("Failed to load measure: {}", path.display()))
}

/// Read an attribute catalog, falling back to the built-in QDM table
pub fn load_catalog(path: Option<&Path>) -> Result<AttributeCatalog> {
    let Some(path) = path else {
        return Ok(AttributeCatalog::qdm());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read attribute catalog: {}", path.display()))?;
    AttributeCatalog::from_json_str(&content)
        .map_err(|e| e.with_context(path.display().to_string()))
        .with_context(|| format!("Failed to load attribute catalog: {}", path.display()))
}
