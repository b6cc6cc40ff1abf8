use crate::types::AnatomicalSlot;
use thiserror::Error;

/// Result type for orthoscan operations
pub type Result<T> = std::result::Result<T, OrthoscanError>;

/// Error types for orthoscan operations
#[derive(Error, Debug)]
pub enum OrthoscanError {
    /// Detection model failed on a slot's image
    #[error("Detection failed for {slot}: {message}")]
    Detection {
        slot: AnatomicalSlot,
        message: String,
    },

    /// No detection model configured for a populated slot
    #[error("No detection model available for {0}")]
    ModelUnavailable(AnatomicalSlot),

    /// Model could not be loaded
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// Stored image could not be decoded
    #[error("Cannot decode image '{key}': {message}")]
    ImageDecode { key: String, message: String },

    /// Upload key rejected by intake
    #[error("Invalid image key: {0}")]
    InvalidKey(String),

    /// Document backend failure
    #[error("Render error: {0}")]
    Render(String),

    /// Invalid value
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OrthoscanError {
    /// Wraps a detector failure for `slot`
    pub fn detection(slot: AnatomicalSlot, err: impl std::fmt::Display) -> Self {
        OrthoscanError::Detection {
            slot,
            message: err.to_string(),
        }
    }

    /// Whether this error aborted detection for a slot
    pub fn is_detection_failure(&self) -> bool {
        matches!(
            self,
            OrthoscanError::Detection { .. }
                | OrthoscanError::ModelUnavailable(_)
                | OrthoscanError::ImageDecode { .. }
        )
    }
}

impl From<String> for OrthoscanError {
    fn from(s: String) -> Self {
        OrthoscanError::InvalidValue(s)
    }
}

impl From<&str> for OrthoscanError {
    fn from(s: &str) -> Self {
        OrthoscanError::InvalidValue(s.to_string())
    }
}

impl From<printpdf::Error> for OrthoscanError {
    fn from(e: printpdf::Error) -> Self {
        OrthoscanError::Render(format!("{}", e))
    }
}
