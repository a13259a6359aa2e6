//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the storage path and log level
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: StoreConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::config::schema::StoreConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyStoragePath,
    StoragePathIsDirectory(String),
    UnknownLogLevel(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyStoragePath => write!(f, "storage.path must not be empty"),
            ValidationError::StoragePathIsDirectory(p) => {
                write!(f, "storage.path `{}` names a directory", p)
            }
            ValidationError::UnknownLogLevel(level) => {
                write!(f, "logging.level `{}` is not one of {}", level, LOG_LEVELS.join(", "))
            }
        }
    }
}

pub fn validate_config(config: &StoreConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let path = &config.storage.path;
    if path.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyStoragePath);
    } else if path.is_dir() {
        errors.push(ValidationError::StoragePathIsDirectory(path.display().to_string()));
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.logging.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
