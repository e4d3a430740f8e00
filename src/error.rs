//! Error types for SmartSight Insights

use thiserror::Error;

/// Errors that can occur during training or inference
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Wellness model is not trained yet")]
    ModelNotReady,

    #[error("Model initialization failed: {0}")]
    InitializationFailure(String),

    #[error("Insufficient training data: {0}")]
    InsufficientData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl InsightError {
    /// Create an invalid input error for a named field
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Whether a caller can recover by correcting its input
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::JsonError(_))
    }
}
