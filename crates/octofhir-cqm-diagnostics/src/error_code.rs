//! CQM error codes following a structured numbering system
//!
//! Error code ranges:
//! - CQM0001-CQM0099: Input errors (malformed ELM or measure documents)
//! - CQM0100-CQM0199: Resolution notes (recoverable outcomes of the engine)
//! - CQM0200-CQM0299: Configuration errors (attribute catalog, engine config)
//! - CQM0400-CQM0499: System errors (I/O)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// Error code identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Create a new error code
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Get the numeric code
    pub const fn code(&self) -> u16 {
        self.0
    }

    /// Get error information for this code
    pub fn info(&self) -> &'static ErrorInfo {
        ERROR_INFO.get(&self.0).unwrap_or(&UNKNOWN_ERROR)
    }

    /// Check if this is an input error (0001-0099)
    pub const fn is_input_error(&self) -> bool {
        self.0 >= 1 && self.0 < 100
    }

    /// Check if this is a resolution note (0100-0199)
    pub const fn is_resolution_note(&self) -> bool {
        self.0 >= 100 && self.0 < 200
    }

    /// Check if this is a configuration error (0200-0299)
    pub const fn is_config_error(&self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Check if this is a system error (0400-0499)
    pub const fn is_system_error(&self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CQM{:04}", self.0)
    }
}

/// Information about an error code
#[derive(Debug, Clone)]
pub struct ErrorInfo {
    /// Short description of the error
    pub description: &'static str,
    /// Detailed help text
    pub help: Option<&'static str>,
}

impl ErrorInfo {
    const fn new(description: &'static str) -> Self {
        Self {
            description,
            help: None,
        }
    }

    const fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }
}

static UNKNOWN_ERROR: ErrorInfo = ErrorInfo::new("Unknown error");

static ERROR_INFO: LazyLock<HashMap<u16, ErrorInfo>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Input errors (0001-0099)
    map.insert(1, ErrorInfo::new("Malformed ELM document")
        .with_help("The document must be an object with a `library` member"));
    map.insert(2, ErrorInfo::new("Missing library identifier"));
    map.insert(3, ErrorInfo::new("Malformed statement list")
        .with_help("`library.statements.def` must be a list of statement definitions"));
    map.insert(4, ErrorInfo::new("Malformed measure document"));
    map.insert(5, ErrorInfo::new("Malformed source data criteria"));
    map.insert(6, ErrorInfo::new("Malformed statement dependency map"));

    // Resolution notes (0100-0199)
    map.insert(100, ErrorInfo::new("Unresolved scope"));
    map.insert(101, ErrorInfo::new("Unknown datatype"));
    map.insert(102, ErrorInfo::new("Attribute not valid for datatype"));
    map.insert(103, ErrorInfo::new("Duplicate attribute"));
    map.insert(104, ErrorInfo::new("Negated criterion"));
    map.insert(105, ErrorInfo::new("Missing value set"));
    map.insert(106, ErrorInfo::new("Unrecognized statement shape"));

    // Configuration errors (0200-0299)
    map.insert(200, ErrorInfo::new("Malformed attribute catalog")
        .with_help("Expected an object mapping datatype names to attribute lists"));
    map.insert(201, ErrorInfo::new("Invalid engine configuration"));

    // System errors (0400-0499)
    map.insert(401, ErrorInfo::new("I/O error"));
    map.insert(404, ErrorInfo::new("File not found"));
    map.insert(406, ErrorInfo::new("Invalid format"));

    map
});

// Input errors
pub const CQM0001: ErrorCode = ErrorCode::new(1);
pub const CQM0002: ErrorCode = ErrorCode::new(2);
pub const CQM0003: ErrorCode = ErrorCode::new(3);
pub const CQM0004: ErrorCode = ErrorCode::new(4);
pub const CQM0005: ErrorCode = ErrorCode::new(5);
pub const CQM0006: ErrorCode = ErrorCode::new(6);

// Resolution notes
pub const CQM0100: ErrorCode = ErrorCode::new(100);
pub const CQM0101: ErrorCode = ErrorCode::new(101);
pub const CQM0102: ErrorCode = ErrorCode::new(102);
pub const CQM0103: ErrorCode = ErrorCode::new(103);
pub const CQM0104: ErrorCode = ErrorCode::new(104);
pub const CQM0105: ErrorCode = ErrorCode::new(105);
pub const CQM0106: ErrorCode = ErrorCode::new(106);

// Configuration errors
pub const CQM0200: ErrorCode = ErrorCode::new(200);
pub const CQM0201: ErrorCode = ErrorCode::new(201);

// System errors
pub const CQM0401: ErrorCode = ErrorCode::new(401);
pub const CQM0404: ErrorCode = ErrorCode::new(404);
pub const CQM0406: ErrorCode = ErrorCode::new(406);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(CQM0001.to_string(), "CQM0001");
        assert_eq!(CQM0103.to_string(), "CQM0103");
    }

    #[test]
    fn test_error_categories() {
        assert!(CQM0003.is_input_error());
        assert!(!CQM0003.is_resolution_note());

        assert!(CQM0104.is_resolution_note());
        assert!(CQM0200.is_config_error());
        assert!(CQM0401.is_system_error());
    }

    #[test]
    fn test_error_info() {
        assert_eq!(CQM0003.info().description, "Malformed statement list");
        assert!(CQM0003.info().help.is_some());
        assert_eq!(ErrorCode::new(999).info().description, "Unknown error");
    }
}
