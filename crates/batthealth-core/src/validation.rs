//! Structural checks on incoming events and range checks on decoded records.
//!
//! Input checks run before any bit is extracted; record checks turn a
//! `DecodedPayload` into a `BatteryHealth` or reject it whole. A failing
//! record never yields partial output.

use std::ops::RangeInclusive;

use thiserror::Error;

use crate::error::ErrorKind;
use crate::payload::DecodedPayload;
use crate::payload::layout;
use crate::payload::error::PayloadError;
use crate::payload::reader::PayloadReader;
use crate::{BatteryHealth, InputEvent, State};

pub const STATE_OF_CHARGE_RANGE: RangeInclusive<f64> = 0.0..=100.0;
pub const TEMPERATURE_RANGE: RangeInclusive<f64> = -20.0..=100.0;

/// Errors returned by input and record validation.
///
/// # Examples
/// ```
/// use batthealth_core::ValidationError;
///
/// let err = ValidationError::InvalidStateCode { code: 9 };
/// assert!(err.to_string().contains("invalid state code"));
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("malformed event: {reason}")]
    MalformedEvent { reason: String },
    #[error("device: must not be empty")]
    EmptyDevice,
    #[error("{field}: expected exactly {expected} characters, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{field}: invalid hex character {character:?} at index {index}")]
    InvalidCharacter {
        field: &'static str,
        index: usize,
        character: char,
    },
    #[error("invalid state code: {code} (expected 0..=8)")]
    InvalidStateCode { code: u8 },
    #[error("{field}: {value} outside allowed range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("time: {value} outside allowed range [{min}, {max}]")]
    TimeOutOfRange { value: u64, min: u64, max: u64 },
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::InvalidStateCode { .. } => ErrorKind::DecodeError,
            _ => ErrorKind::ValidationError,
        }
    }
}

/// Caller-tunable validation rules.
///
/// The default accepts an empty device and any 36-bit time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub require_device: bool,
    pub time_range: Option<RangeInclusive<u64>>,
}

impl ValidationPolicy {
    pub fn strict_device(mut self) -> Self {
        self.require_device = true;
        self
    }

    pub fn with_time_range(mut self, range: RangeInclusive<u64>) -> Self {
        self.time_range = Some(range);
        self
    }
}

/// Check the event shape before decoding: payload length and digits, and
/// the device when the policy requires one.
pub fn validate_input(
    event: &InputEvent,
    policy: &ValidationPolicy,
) -> Result<(), ValidationError> {
    if policy.require_device && event.device.is_empty() {
        return Err(ValidationError::EmptyDevice);
    }

    let actual = event.payload.chars().count();
    if actual != layout::PAYLOAD_HEX_LEN {
        return Err(ValidationError::InvalidLength {
            field: "payload",
            expected: layout::PAYLOAD_HEX_LEN,
            actual,
        });
    }

    // Everything before the first bad byte is ASCII, so its byte index is
    // also its character index.
    PayloadReader::new(&event.payload)
        .map(|_| ())
        .map_err(|err| match err {
            PayloadError::InvalidHex {
                index, character, ..
            } => ValidationError::InvalidCharacter {
                field: "payload",
                index,
                character,
            },
            PayloadError::TooShort { actual, .. } => ValidationError::InvalidLength {
                field: "payload",
                expected: layout::PAYLOAD_HEX_LEN,
                actual: actual * layout::HEX_CHARS_PER_BYTE,
            },
        })
}

/// Map the decoded fields to a record, enforcing the state code set and
/// value ranges.
pub fn validate_record(
    device: &str,
    decoded: &DecodedPayload,
    policy: &ValidationPolicy,
) -> Result<BatteryHealth, ValidationError> {
    let state = State::try_from(decoded.state_code)
        .map_err(|code| ValidationError::InvalidStateCode { code })?;
    check_range(
        "state_of_charge",
        decoded.state_of_charge,
        &STATE_OF_CHARGE_RANGE,
    )?;
    check_range("temperature", decoded.temperature, &TEMPERATURE_RANGE)?;
    if let Some(range) = &policy.time_range {
        if !range.contains(&decoded.time) {
            return Err(ValidationError::TimeOutOfRange {
                value: decoded.time,
                min: *range.start(),
                max: *range.end(),
            });
        }
    }

    Ok(BatteryHealth {
        device: device.to_string(),
        time: decoded.time,
        state,
        state_of_charge: decoded.state_of_charge,
        temperature: decoded.temperature,
    })
}

fn check_range(
    field: &'static str,
    value: f64,
    range: &RangeInclusive<f64>,
) -> Result<(), ValidationError> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(ValidationError::OutOfRange {
        field,
        value,
        min: *range.start(),
        max: *range.end(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(device: &str, payload: &str) -> InputEvent {
        InputEvent {
            device: device.to_string(),
            payload: payload.to_string(),
        }
    }

    fn decoded(state_code: u8, state_of_charge: f64, temperature: f64) -> DecodedPayload {
        DecodedPayload {
            device_type: 1,
            time: 1_668_181_615,
            state_code,
            state_of_charge,
            temperature,
        }
    }

    #[test]
    fn input_accepts_mixed_case_hex() {
        let policy = ValidationPolicy::default();
        assert!(validate_input(&event("device_1", "f1e6E63676c75000"), &policy).is_ok());
    }

    #[test]
    fn input_accepts_empty_device_by_default() {
        let policy = ValidationPolicy::default();
        assert!(validate_input(&event("", "F1E6E63676C75000"), &policy).is_ok());

        let strict = ValidationPolicy::default().strict_device();
        assert_eq!(
            validate_input(&event("", "F1E6E63676C75000"), &strict),
            Err(ValidationError::EmptyDevice)
        );
    }

    #[test]
    fn input_rejects_wrong_length() {
        let policy = ValidationPolicy::default();
        for payload in ["", "F1E6E63676C750", "F1E6E63676C7500000"] {
            let err = validate_input(&event("d", payload), &policy).unwrap_err();
            assert_eq!(
                err,
                ValidationError::InvalidLength {
                    field: "payload",
                    expected: 16,
                    actual: payload.len()
                }
            );
        }
    }

    #[test]
    fn input_rejects_non_hex() {
        let policy = ValidationPolicy::default();
        let err = validate_input(&event("d", "F1E6E63676C7500Z"), &policy).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidCharacter {
                field: "payload",
                index: 15,
                character: 'Z'
            }
        );
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn input_counts_characters_not_bytes() {
        let policy = ValidationPolicy::default();
        let err = validate_input(&event("d", "F1E6E63676C7500é"), &policy).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidCharacter { index: 15, character: 'é', .. }
        ));

        let err = validate_input(&event("d", "F1E6é63676C75000"), &policy).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidCharacter { index: 4, character: 'é', .. }
        ));
    }

    #[test]
    fn input_reports_first_bad_character() {
        let policy = ValidationPolicy::default();
        let err = validate_input(&event("d", "F1+6E63676C7500Z"), &policy).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidCharacter {
                field: "payload",
                index: 2,
                character: '+'
            }
        );
    }

    #[test]
    fn record_maps_error_and_undefined_states() {
        let policy = ValidationPolicy::default();
        let record = validate_record("d", &decoded(7, 50.0, 20.0), &policy).unwrap();
        assert_eq!(record.state, State::Error);
        let record = validate_record("d", &decoded(8, 50.0, 20.0), &policy).unwrap();
        assert_eq!(record.state, State::Undefined);
    }

    #[test]
    fn record_rejects_unknown_state_codes() {
        let policy = ValidationPolicy::default();
        for code in 9..=15u8 {
            let err = validate_record("d", &decoded(code, 50.0, 20.0), &policy).unwrap_err();
            assert_eq!(err, ValidationError::InvalidStateCode { code });
            assert_eq!(err.kind(), ErrorKind::DecodeError);
        }
    }

    #[test]
    fn record_range_bounds_are_inclusive() {
        let policy = ValidationPolicy::default();
        assert!(validate_record("d", &decoded(2, 0.0, -20.0), &policy).is_ok());
        assert!(validate_record("d", &decoded(2, 100.0, 100.0), &policy).is_ok());
    }

    #[test]
    fn record_rejects_out_of_range_values() {
        let policy = ValidationPolicy::default();
        let err = validate_record("d", &decoded(2, 127.5, 20.0), &policy).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                field: "state_of_charge",
                value: 127.5,
                min: 0.0,
                max: 100.0
            }
        );
        assert_eq!(
            err.to_string(),
            "state_of_charge: 127.5 outside allowed range [0, 100]"
        );

        let err = validate_record("d", &decoded(2, 50.0, 107.5), &policy).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange { field: "temperature", .. }
        ));
    }

    #[test]
    fn record_time_policy() {
        let policy = ValidationPolicy::default().with_time_range(0..=1_000);
        let err = validate_record("d", &decoded(2, 50.0, 20.0), &policy).unwrap_err();
        assert_eq!(
            err,
            ValidationError::TimeOutOfRange {
                value: 1_668_181_615,
                min: 0,
                max: 1_000
            }
        );
        let default = ValidationPolicy::default();
        assert!(validate_record("d", &decoded(2, 50.0, 20.0), &default).is_ok());
    }

    #[test]
    fn record_passes_device_through() {
        let policy = ValidationPolicy::default();
        let record = validate_record("rack/7 ünit", &decoded(3, 42.5, 31.0), &policy).unwrap();
        assert_eq!(record.device, "rack/7 ünit");
        assert_eq!(record.state, State::Charge);
        assert_eq!(record.state_of_charge, 42.5);
        assert_eq!(record.temperature, 31.0);
    }
}
