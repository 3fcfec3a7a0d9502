//! Event sources for batch handling.
//!
//! Sources own all I/O; they hand raw JSON values to the handler, which does
//! the typing and validation.

mod json;

pub use json::JsonEventSource;

use serde_json::Value;
use thiserror::Error;

pub trait EventSource {
    fn next_event(&mut self) -> Result<Option<Value>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed JSON in event #{index}: {message}")]
    Json { index: usize, message: String },
}
