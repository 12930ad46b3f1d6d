//! Semantic validation of loaded configuration.

use thiserror::Error;

use crate::load::Config;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::InvalidValue { .. } => 65,
            ValidationError::VersionMismatch { .. } => 66,
        }
    }
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
}

/// Validate a configuration semantically.
pub fn validate_config(config: &Config) -> ValidationResult<()> {
    if config.schema_version != crate::CONFIG_SCHEMA_VERSION {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    let detection = &config.detection;
    if detection.backup_suffix.trim().is_empty() {
        return Err(invalid("detection.backup_suffix", "must not be empty"));
    }
    if detection.ledger_global.trim().is_empty() {
        return Err(invalid("detection.ledger_global", "must not be empty"));
    }
    // An empty fragment is contained in every key and would blind the walker.
    if let Some(pos) = detection.denylist.iter().position(|f| f.is_empty()) {
        return Err(invalid(
            format!("detection.denylist[{pos}]"),
            "empty fragment matches every member name",
        ));
    }

    for (field, value) in config.report.fields() {
        if value.trim().is_empty() {
            return Err(invalid(format!("report.{field}"), "must not be empty"));
        }
    }

    Ok(())
}
