//! Data-criteria attribute resolution for clinical quality measures
//!
//! This crate bundles:
//! - Lenient loading of compiled measure logic (ELM JSON)
//! - Static resolution of the attributes each source data criterion is read through
//! - Annotation of source data criteria with `{ attribute_name, attribute_valueset }`
//! - Statement complexity analysis
//!
//! # Example
//!
//! ```no_run
//! use octofhir_cqm::annotate_str;
//!
//! # fn main() -> octofhir_cqm::Result<()> {
//! let input = std::fs::read_to_string("measure.json")?;
//! let (measure, report) = annotate_str(&input)?;
//! println!("{} criteria, {} attributes attached", measure.source_data_criteria.len(), report.attached);
//! # Ok(())
//! # }
//! ```

// Re-export all public APIs from internal crates
pub use octofhir_cqm_criteria as criteria;
pub use octofhir_cqm_diagnostics as diagnostics;
pub use octofhir_cqm_elm as elm;

// Convenience re-exports
pub use octofhir_cqm_criteria::{
    AnnotationReport, AttributeCatalog, AttributeEngine, EngineConfig, MeasureInput, statement_complexity,
};
pub use octofhir_cqm_diagnostics::{CqmError, Result};
pub use octofhir_cqm_elm::ElmDocument;

/// Parse a measure document and annotate it with the built-in QDM catalog
pub fn annotate_str(input: &str) -> Result<(MeasureInput, AnnotationReport)> {
    let mut measure = MeasureInput::from_json_str(input)?;
    let report = AttributeEngine::qdm().annotate(&mut measure);
    Ok((measure, report))
}

// CLI module (only available with cli feature)
#[cfg(feature = "cli")]
pub mod cli;
