//! Error types for BakeBuddy
//!
//! One error enum for the whole library. Only the upstream variants are
//! meant to reach an end user; malformed judge output, unknown pricing and
//! empty retrieval are absorbed before they become errors.

use thiserror::Error;

/// Main error type for the retrieval and answer pipeline
#[derive(Error, Debug)]
pub enum BakeError {
    /// Pipeline stage machine errors
    #[error("Invalid stage transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// Vector index (Qdrant) errors
    #[error("Index error: {0}")]
    IndexError(String),

    /// Embedding endpoint errors
    #[error("Embedding API error: {0}")]
    EmbeddingError(String),

    /// Chat completion endpoint errors
    #[error("Model API error: {0}")]
    ModelApiError(String),

    /// Model answered without any text
    #[error("Model '{model}' returned no content")]
    EmptyCompletion { model: String },

    /// Model response did not have the expected shape
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// A recipe payload lacks a field the prompt template needs
    #[error("Recipe {id} is missing required field '{field}'")]
    MissingField { id: String, field: String },

    /// Conversation store errors
    #[error("Store error: {0}")]
    StoreError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("BakeBuddy error: {0}")]
    Generic(String),
}

impl BakeError {
    /// Whether this error means an index or model endpoint was unreachable
    /// or answered with an error.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            BakeError::IndexError(_)
                | BakeError::EmbeddingError(_)
                | BakeError::ModelApiError(_)
                | BakeError::EmptyCompletion { .. }
                | BakeError::MalformedResponse(_)
                | BakeError::HttpError(_)
        )
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, BakeError>;

impl From<anyhow::Error> for BakeError {
    fn from(err: anyhow::Error) -> Self {
        BakeError::Generic(err.to_string())
    }
}

impl From<rusqlite::Error> for BakeError {
    fn from(err: rusqlite::Error) -> Self {
        BakeError::StoreError(err.to_string())
    }
}

impl From<qdrant_client::QdrantError> for BakeError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        BakeError::IndexError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_display() {
        let err = BakeError::MissingField {
            id: "42".to_string(),
            field: "kcal".to_string(),
        };
        assert!(err.to_string().contains("42"));
        assert!(err.to_string().contains("kcal"));
    }

    #[test]
    fn test_upstream_classification() {
        assert!(BakeError::ModelApiError("HTTP 503".to_string()).is_upstream());
        assert!(BakeError::IndexError("connection refused".to_string()).is_upstream());
        assert!(BakeError::EmptyCompletion {
            model: "gpt-5-mini".to_string()
        }
        .is_upstream());

        assert!(!BakeError::StoreError("locked".to_string()).is_upstream());
        assert!(!BakeError::MissingField {
            id: "1".to_string(),
            field: "name".to_string(),
        }
        .is_upstream());
    }

    #[test]
    fn test_invalid_transition_error() {
        let err = BakeError::InvalidTransition {
            from: "Generate".to_string(),
            to: "Retrieve".to_string(),
            reason: "stages only move forward".to_string(),
        };
        assert!(err.to_string().contains("Generate"));
        assert!(err.to_string().contains("Retrieve"));
    }
}
