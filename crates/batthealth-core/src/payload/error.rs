use thiserror::Error;

/// Errors returned while reading fields out of a hex payload.
///
/// Note: this error type is re-exported from the crate root.
///
/// # Examples
/// ```
/// use batthealth_core::PayloadError;
///
/// let err = PayloadError::TooShort { needed: 7, actual: 4 };
/// assert!(err.to_string().contains("payload too short"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("invalid hex digit {character:?} at character {index} (byte {offset})")]
    InvalidHex {
        offset: usize,
        index: usize,
        character: char,
    },
}
