//! Data-criteria attribute resolution
//!
//! Statically analyzes the compiled logic (ELM) of a clinical quality measure
//! to find, for each source data criterion, which attributes the logic reads
//! and which value set qualifies each read. The discovered attributes are
//! appended to the criteria as `{ attribute_name, attribute_valueset }`
//! descriptors.
//!
//! ```no_run
//! use octofhir_cqm_criteria::{AttributeEngine, MeasureInput};
//!
//! # fn main() -> octofhir_cqm_diagnostics::Result<()> {
//! let mut measure = MeasureInput::from_json_str(&std::fs::read_to_string("measure.json")?)?;
//! let report = AttributeEngine::qdm().annotate(&mut measure);
//! println!("attached {} attributes", report.attached);
//! # Ok(())
//! # }
//! ```

pub mod aliases;
pub mod attacher;
pub mod catalog;
pub mod classifier;
pub mod complexity;
pub mod context;
pub mod criteria;
pub mod dependencies;
pub mod engine;
pub mod measure;
pub mod properties;
pub mod unions;
pub mod valuesets;

pub use attacher::{AnnotationReport, SkipReason, SkippedAttribute};
pub use catalog::{AttributeCatalog, Recognition};
pub use classifier::StatementShape;
pub use complexity::{StatementComplexity, statement_complexity};
pub use context::{ResolutionContext, RootBinding};
pub use criteria::{AttributeDescriptor, SourceDataCriteria, SourceDataCriterion, derive_datatype};
pub use dependencies::{DependencyMap, RelevantStatements, StatementDependency};
pub use engine::{Analysis, AnalysisReport, AttributeEngine, EngineConfig};
pub use measure::MeasureInput;
pub use properties::AttributeTriple;
pub use valuesets::ValueSetTable;
