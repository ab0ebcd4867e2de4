// ABOUTME: Custom error types for the migrator
// ABOUTME: Provides context-specific error variants with actionable messages

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigratorError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Manifest error: {0}")]
    Manifest(String),
}

/// Raised when an engine error message is not in the `Key: value` format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("error message is empty")]
    EmptyInput,
    #[error("error message has no Detail field")]
    MissingDetail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MigratorError::Validation("source URL is empty".to_string());
        assert_eq!(err.to_string(), "Validation error: source URL is empty");
        assert_eq!(
            FormatError::MissingDetail.to_string(),
            "error message has no Detail field"
        );
    }
}
