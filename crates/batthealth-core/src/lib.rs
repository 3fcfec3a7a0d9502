//! Battery pack status decoding.
//!
//! This crate turns an 8-byte battery telemetry payload, carried as 16 hex
//! digits, into a validated health record. The pipeline is:
//! structural validation -> byte decomposition (`payload`) -> per-field bit
//! extraction and scaling -> range validation (`validation`) -> record.
//! Decoding is pure and side-effect free; file access lives in `source` and
//! the request/response mapping in `handler`.
//!
//! Invariants:
//! - A failing payload produces no partial record.
//! - The same input always yields the same record or the same error.
//! - State codes outside 0..=8 are rejected, never defaulted.
//!
//! # Examples
//! ```
//! use batthealth_core::{State, decode};
//!
//! let record = decode("device_1", "F1E6E63676C75000")?;
//! assert_eq!(record.time, 1_668_181_615);
//! assert_eq!(record.state, State::Error);
//! assert_eq!(record.state_of_charge, 99.5);
//! assert_eq!(record.temperature, 20.0);
//! # Ok::<(), batthealth_core::Error>(())
//! ```

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

mod error;
mod handler;
pub mod payload;
mod source;
mod state;
pub mod validation;

pub use error::{Error, ErrorKind};
pub use handler::{
    Response, ResponseBody, STATUS_BAD_REQUEST, STATUS_INTERNAL_ERROR, STATUS_OK, handle_event,
    handle_events, parse_input_event,
};
pub use payload::error::PayloadError;
pub use payload::{DecodedPayload, decode_payload};
pub use source::{EventSource, JsonEventSource, SourceError};
pub use state::State;
pub use validation::{ValidationError, ValidationPolicy};

/// Incoming request: an opaque device id and the hex payload.
///
/// # Examples
/// ```
/// use batthealth_core::InputEvent;
///
/// let event: InputEvent =
///     serde_json::from_str(r#"{"device":"device_1","payload":"F1E6E63676C75000"}"#)?;
/// assert_eq!(event.device, "device_1");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Device identifier, passed through unchanged.
    pub device: String,
    /// 16 hex digits encoding the 8-byte status record.
    pub payload: String,
}

/// Validated battery health record.
///
/// The device type nibble is not part of the record; it is available on
/// `DecodedPayload`.
///
/// # Examples
/// ```
/// use batthealth_core::{BatteryHealth, State};
///
/// let record = BatteryHealth {
///     device: "device_2".to_string(),
///     time: 1_668_453_961,
///     state: State::Discharge,
///     state_of_charge: 100.0,
///     temperature: 22.0,
/// };
/// let json = serde_json::to_value(&record)?;
/// assert_eq!(json["state"], "discharge");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryHealth {
    pub device: String,
    /// Seconds since the Unix epoch (36-bit, not checked for plausibility
    /// unless the policy sets a time range).
    pub time: u64,
    pub state: State,
    /// Percent, within 0.0..=100.0.
    pub state_of_charge: f64,
    /// Degrees Celsius, within -20.0..=100.0.
    pub temperature: f64,
}

impl BatteryHealth {
    /// RFC3339 rendering of `time`, if it fits a calendar date.
    ///
    /// # Examples
    /// ```
    /// use batthealth_core::decode;
    ///
    /// let record = decode("device_1", "F1E6E63676C75000")?;
    /// assert_eq!(record.time_rfc3339().as_deref(), Some("2022-11-11T15:46:55Z"));
    /// # Ok::<(), batthealth_core::Error>(())
    /// ```
    pub fn time_rfc3339(&self) -> Option<String> {
        let seconds = i64::try_from(self.time).ok()?;
        OffsetDateTime::from_unix_timestamp(seconds)
            .ok()
            .and_then(|dt| dt.format(&Rfc3339).ok())
    }
}

/// Run the full pipeline on a typed event.
///
/// # Errors
/// Returns `Error::Validation` for structural or range failures and
/// `Error::Payload` when a byte cannot be read.
pub fn parse_battery_health(
    event: &InputEvent,
    policy: &ValidationPolicy,
) -> Result<BatteryHealth, Error> {
    validation::validate_input(event, policy)?;
    let decoded = decode_payload(&event.payload)?;
    log::debug!(
        "device {} reports device type {}",
        event.device,
        decoded.device_type
    );
    let record = validation::validate_record(&event.device, &decoded, policy)?;
    Ok(record)
}

/// Decode one payload with the default policy.
pub fn decode(device: &str, payload: &str) -> Result<BatteryHealth, Error> {
    let event = InputEvent {
        device: device.to_string(),
        payload: payload.to_string(),
    };
    parse_battery_health(&event, &ValidationPolicy::default())
}
