//! Error types for dishfill

use crate::Compartment;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration-related errors. Fatal at startup, never per request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("Capacity for the {0} compartment must be greater than zero")]
    ZeroCapacity(Compartment),

    #[error("Label '{label}' is assigned to both the {first} and {second} compartments")]
    DuplicateLabel {
        label: String,
        first: Compartment,
        second: Compartment,
    },

    #[error("Invalid compartment weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("API key environment variable {0} is not set")]
    MissingApiKey(String),
}

/// Failures on the advisory (language model) path
#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("Response is not a percentage: {0}")]
    ParseError(String),

    #[error("Percentage {0} is outside 0-100")]
    InvalidRange(f64),

    #[error("Response was empty")]
    EmptyResponse,

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("No response within {0:?}")]
    Timeout(Duration),
}

impl AdvisoryError {
    /// Transport failures skip the retry and go straight to fallback
    pub fn is_transport(&self) -> bool {
        matches!(self, AdvisoryError::Transport(_) | AdvisoryError::Timeout(_))
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid detection at index {index}: {reason}")]
    InvalidDetection { index: usize, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Advisory model unusable: {0}")]
    Upstream(String),
}

impl Error {
    /// External error kind reported to callers
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::Config(_) => ErrorKind::ConfigurationError,
            Error::Upstream(_) => ErrorKind::UpstreamError,
            Error::Json(_) | Error::InvalidDetection { .. } | Error::InvalidInput(_) => {
                ErrorKind::ValidationError
            }
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorBody {
                kind: self.kind(),
                message: self.to_string(),
            },
        }
    }
}

/// Error kind in the structured failure response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ConfigurationError,
    UpstreamError,
    ValidationError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

/// Serialized failure: `{"error": {"kind": ..., "message": ...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

pub type Result<T> = std::result::Result<T, Error>;
