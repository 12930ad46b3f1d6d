//! Hookscope configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for `config.toml`
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation

pub mod detection;
pub mod labels;
pub mod load;
pub mod resolve;
pub mod validate;

pub use detection::DetectionConfig;
pub use labels::ReportLabels;
pub use load::{load_config, load_config_from_path, Config, ConfigError, ResolvedConfig};
pub use resolve::{resolve_config_path, ConfigSource};
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
