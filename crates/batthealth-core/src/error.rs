use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::payload::error::PayloadError;
use crate::validation::ValidationError;

/// Coarse error category reported to callers.
///
/// # Examples
/// ```
/// use batthealth_core::ErrorKind;
///
/// assert_eq!(ErrorKind::DecodeError.as_str(), "decode_error");
/// assert!(ErrorKind::ValidationError.is_client_error());
/// assert!(!ErrorKind::InternalError.is_client_error());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ValidationError,
    DecodeError,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "validation_error",
            ErrorKind::DecodeError => "decode_error",
            ErrorKind::InternalError => "internal_error",
        }
    }

    /// Whether the failure stems from the caller's input.
    pub fn is_client_error(self) -> bool {
        !matches!(self, ErrorKind::InternalError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("decode error: {0}")]
    Payload(#[from] PayloadError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(err) => err.kind(),
            Error::Payload(_) => ErrorKind::DecodeError,
            Error::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Human-readable detail lines for error responses.
    pub fn details(&self) -> Vec<String> {
        let detail = match self {
            Error::Validation(err) => err.to_string(),
            Error::Payload(err) => err.to_string(),
            Error::Internal(message) => message.clone(),
        };
        vec![detail]
    }
}
