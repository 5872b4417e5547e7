//! Registry error types

use thiserror::Error;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("No current version set")]
    NoCurrentVersion,

    #[error("Configuration not found: {0}")]
    ConfigNotFound(String),

    #[error("Concurrent write conflict: gave up after {attempts} attempts")]
    ConcurrentWriteConflict { attempts: usize },

    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Lock error")]
    Lock,
}

impl From<std::io::Error> for RegistryError {
    fn from(e: std::io::Error) -> Self {
        RegistryError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(e: serde_json::Error) -> Self {
        RegistryError::Serialization(e.to_string())
    }
}

/// Result type for registry operations
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = RegistryError::VersionNotFound("rf_20240101_120000".into());
        assert!(e.to_string().contains("rf_20240101_120000"));

        let e = RegistryError::ConcurrentWriteConflict { attempts: 8 };
        assert!(e.to_string().contains('8'));
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let e: RegistryError = io_err.into();
        assert!(matches!(e, RegistryError::Storage(ref m) if m.contains("disk full")));
    }
}
