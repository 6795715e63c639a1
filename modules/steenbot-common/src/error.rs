use std::time::Duration;

use thiserror::Error;

/// Result type alias used across the bot core.
pub type Result<T> = std::result::Result<T, SteenBotError>;

#[derive(Error, Debug)]
pub enum SteenBotError {
    /// Malformed input, duplicate ids, bad configuration.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A processor, handler, condition or action failed.
    #[error("Processing error: {0}")]
    Processing(String),

    /// Adapter validate/connect/disconnect failure.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: String,
        after: Duration,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SteenBotError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_formats_kind_and_id() {
        let err = SteenBotError::not_found("Adapter", "gh-1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Adapter not found: gh-1");
    }

    #[test]
    fn anyhow_errors_convert_transparently() {
        let err: SteenBotError = anyhow::anyhow!("boom").into();
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "boom");
    }
}
