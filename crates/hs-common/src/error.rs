//! Error types for hookscope.
//!
//! Every error carries:
//! - A stable numeric code for machine parsing
//! - A category for grouping
//! - A recoverability hint
//!
//! None of the detection-pipeline errors are fatal. The pipeline recovers
//! each kind locally (skip the member, substitute a placeholder, fail open)
//! and keeps going; the codes exist so the recovery can be logged precisely.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for hookscope operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Reference environment could not be produced or walked.
    Baseline,
    /// A member's textual form could not be classified.
    Classification,
    /// A wrapper could not be installed over a live binding.
    Installation,
    /// Ledger contents could not be rendered to text.
    Render,
    /// Rendered text could not be handed to the export sink.
    Export,
    /// Configuration file errors.
    Config,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Baseline => write!(f, "baseline"),
            ErrorCategory::Classification => write!(f, "classification"),
            ErrorCategory::Installation => write!(f, "installation"),
            ErrorCategory::Render => write!(f, "render"),
            ErrorCategory::Export => write!(f, "export"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for hookscope.
#[derive(Error, Debug)]
pub enum Error {
    // Baseline errors (10-19)
    #[error("baseline unavailable: {0}")]
    BaselineUnavailable(String),

    // Classification errors (20-29)
    #[error("cannot classify member {name}: source text unavailable")]
    ClassificationAmbiguous { name: String },

    // Installation errors (30-39)
    #[error("cannot install interceptor for {name}: {reason}")]
    InstallationConflict { name: String, reason: String },

    // Render errors (40-49)
    #[error("value not representable as text: {0}")]
    RenderUnrepresentable(String),

    // Export errors (50-59)
    #[error("export failed: {0}")]
    ExportFailed(String),

    // Configuration errors (60-69)
    #[error("configuration error: {0}")]
    Config(String),

    // I/O errors (70-79)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the stable error code for this error.
    ///
    /// - 10-19: Baseline errors
    /// - 20-29: Classification errors
    /// - 30-39: Installation errors
    /// - 40-49: Render errors
    /// - 50-59: Export errors
    /// - 60-69: Configuration errors
    /// - 70-79: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::BaselineUnavailable(_) => 10,
            Error::ClassificationAmbiguous { .. } => 20,
            Error::InstallationConflict { .. } => 30,
            Error::RenderUnrepresentable(_) => 40,
            Error::ExportFailed(_) => 50,
            Error::Config(_) => 60,
            Error::Io(_) => 70,
            Error::Json(_) => 71,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::BaselineUnavailable(_) => ErrorCategory::Baseline,
            Error::ClassificationAmbiguous { .. } => ErrorCategory::Classification,
            Error::InstallationConflict { .. } => ErrorCategory::Installation,
            Error::RenderUnrepresentable(_) => ErrorCategory::Render,
            Error::ExportFailed(_) => ErrorCategory::Export,
            Error::Config(_) => ErrorCategory::Config,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether the overall pipeline continues after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Fail open: nothing gets instrumented, but nothing breaks either
            Error::BaselineUnavailable(_) => true,
            Error::ClassificationAmbiguous { .. } => true,
            // Member skipped, the rest proceed
            Error::InstallationConflict { .. } => true,
            Error::RenderUnrepresentable(_) => true,
            Error::ExportFailed(_) => true,
            Error::Config(_) => false,
            Error::Io(_) => false,
            Error::Json(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_grouped_by_category() {
        let cases = [
            (Error::BaselineUnavailable("x".into()), 10, ErrorCategory::Baseline),
            (
                Error::ClassificationAmbiguous { name: "f".into() },
                20,
                ErrorCategory::Classification,
            ),
            (
                Error::InstallationConflict {
                    name: "f".into(),
                    reason: "gone".into(),
                },
                30,
                ErrorCategory::Installation,
            ),
            (Error::RenderUnrepresentable("cycle".into()), 40, ErrorCategory::Render),
            (Error::ExportFailed("denied".into()), 50, ErrorCategory::Export),
            (Error::Config("bad".into()), 60, ErrorCategory::Config),
        ];
        for (err, code, category) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.category(), category);
        }
    }

    #[test]
    fn test_pipeline_errors_are_recoverable() {
        assert!(Error::BaselineUnavailable("timeout".into()).is_recoverable());
        assert!(Error::ExportFailed("denied".into()).is_recoverable());
        assert!(!Error::Config("bad".into()).is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = Error::InstallationConflict {
            name: "bridge".into(),
            reason: "binding deleted".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot install interceptor for bridge: binding deleted"
        );
        assert_eq!(ErrorCategory::Installation.to_string(), "installation");
    }
}
