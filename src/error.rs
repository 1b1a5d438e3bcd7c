//! Error types for Posture Flux

use thiserror::Error;

/// Errors that can occur while classifying posture
#[derive(Debug, Error)]
pub enum PostureError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid calibration: {0}")]
    InvalidCalibration(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse frame: {0}")]
    ParseError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
