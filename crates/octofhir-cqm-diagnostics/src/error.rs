//! CQM error types

use crate::{CQM0401, CQM0404, CQM0406, ErrorCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Error - the invocation cannot proceed
    Error,
    /// Warning - potential issue but can continue
    Warning,
    /// Information - informational message
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic message with location and context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Where the problem was found, e.g. `Library.Statement` or a file path
    pub location: Option<String>,
    /// Additional context or help
    pub help: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Error, code, message)
    }

    /// Create a new warning diagnostic
    pub fn warning(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Warning, code, message)
    }

    /// Create a new informational diagnostic
    pub fn info(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::with_severity(Severity::Info, code, message)
    }

    fn with_severity(severity: Severity, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            location: None,
            help: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render the diagnostic for a terminal, with colors
    #[cfg(feature = "colored")]
    pub fn render(&self) -> String {
        use colored::Colorize;

        let severity = match self.severity {
            Severity::Error => self.severity.to_string().red().bold(),
            Severity::Warning => self.severity.to_string().yellow().bold(),
            Severity::Info => self.severity.to_string().blue().bold(),
        };
        let mut out = format!("{}[{}]: {}", severity, self.code, self.message);
        if let Some(loc) = &self.location {
            out.push_str(&format!("\n  {} {}", "-->".cyan(), loc));
        }
        if let Some(help) = &self.help {
            out.push_str(&format!("\n  {} {}", "help:".green(), help));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.severity, self.code, self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " at {}", loc)?;
        }
        Ok(())
    }
}

/// Main CQM error type
#[derive(Debug, Clone, Error)]
pub enum CqmError {
    /// Malformed input document (ELM library, measure, criteria)
    #[error("{code}: {message}")]
    Input {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// Malformed configuration (attribute catalog, engine options)
    #[error("{code}: {message}")]
    Config {
        code: ErrorCode,
        message: String,
        context: Option<String>,
    },

    /// I/O failure while reading inputs
    #[error("{code}: {message}")]
    Io {
        code: ErrorCode,
        message: String,
        path: Option<String>,
    },

    /// Multiple errors collected
    #[error("Multiple errors: {}", .0.len())]
    Multiple(Vec<CqmError>),
}

impl CqmError {
    /// Create an input error
    pub fn input(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Input {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Create a configuration error
    pub fn config(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Create an I/O error
    pub fn io(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Io {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Combine collected errors: `None` when empty, the error itself when single
    pub fn from_errors(mut errors: Vec<CqmError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Input { code, .. } => *code,
            Self::Config { code, .. } => *code,
            Self::Io { code, .. } => *code,
            Self::Multiple(errors) => errors.first().map(|e| e.code()).unwrap_or(ErrorCode::new(0)),
        }
    }

    /// Attach context, e.g. the library or file the error belongs to
    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        match &mut self {
            Self::Input { context, .. } | Self::Config { context, .. } => {
                *context = Some(ctx.into());
            }
            Self::Io { path, .. } => *path = Some(ctx.into()),
            Self::Multiple(_) => {}
        }
        self
    }

    /// One diagnostic per collected error
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            Self::Multiple(errors) => errors.iter().flat_map(CqmError::diagnostics).collect(),
            other => vec![other.to_diagnostic()],
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Input { code, message, context } | Self::Config { code, message, context } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(ctx) = context {
                    diag = diag.with_location(ctx.clone());
                }
                if let Some(help) = code.info().help {
                    diag = diag.with_help(help);
                }
                diag
            }
            Self::Io { code, message, path } => {
                let mut diag = Diagnostic::error(*code, message.clone());
                if let Some(path) = path {
                    diag = diag.with_location(path.clone());
                }
                diag
            }
            Self::Multiple(errors) => {
                if let Some(first) = errors.first() {
                    first.to_diagnostic()
                } else {
                    Diagnostic::error(ErrorCode::new(0), "Unknown error")
                }
            }
        }
    }
}

impl From<std::io::Error> for CqmError {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => CQM0404,
            _ => CQM0401,
        };
        Self::io(code, err.to_string())
    }
}

impl From<serde_json::Error> for CqmError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Self::io(CQM0401, err.to_string())
        } else {
            Self::input(CQM0406, err.to_string())
        }
    }
}
