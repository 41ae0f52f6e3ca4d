//! CQM diagnostics and error handling
//!
//! This crate provides the error handling infrastructure shared by the ELM
//! loader, the attribute resolution engine and the command-line tool:
//! structured error codes, the error type and renderable diagnostics.

mod error;
mod error_code;

pub use error::*;
pub use error_code::*;

/// Result type for CQM operations
pub type Result<T> = std::result::Result<T, CqmError>;
