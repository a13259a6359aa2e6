//! Error definitions for the settings engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading, writing or editing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The durable blob could not be read or written.
    #[error("Storage error at {}: {source}", .path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blob could not be serialized.
    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),

    /// A value of the wrong kind was assigned to a field.
    #[error("Type mismatch for field `{field}`: expected {expected}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
    },

    /// A lookup by name referred to a field outside the schema.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A deprecated field was addressed by name.
    #[error("Field `{0}` is deprecated")]
    Deprecated(&'static str),

    /// Textual input could not be parsed into the field's type.
    #[error("Invalid value `{value}` for field `{field}`")]
    InvalidValue { field: &'static str, value: String },
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SettingsError::TypeMismatch {
            field: "rssi_min",
            expected: "i16",
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch for field `rssi_min`: expected i16"
        );

        let err = SettingsError::Storage {
            path: PathBuf::from("/tmp/settings.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/tmp/settings.json"));
        assert!(err.to_string().contains("denied"));
    }
}
