use log::debug;

use super::error::PayloadError;
use super::layout;
use super::reader::PayloadReader;

/// Every field of a payload, decoded but not yet range-checked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedPayload {
    pub device_type: u8,
    pub time: u64,
    /// Raw 4-bit state code; mapping to `State` happens during validation.
    pub state_code: u8,
    pub state_of_charge: f64,
    pub temperature: f64,
}

/// Decode all fields of a hex payload.
///
/// Only the bytes covered by the layout are required; length and character
/// set of the full 16-digit payload are checked by the validator.
///
/// # Examples
/// ```
/// use batthealth_core::payload::decode_payload;
///
/// let decoded = decode_payload("F1E6E63676C75000")?;
/// assert_eq!(decoded.device_type, 1);
/// assert_eq!(decoded.time, 1_668_181_615);
/// assert_eq!(decoded.state_code, 7);
/// # Ok::<(), batthealth_core::PayloadError>(())
/// ```
pub fn decode_payload(payload: &str) -> Result<DecodedPayload, PayloadError> {
    let reader = PayloadReader::new(payload)?;
    reader.require_len(layout::MIN_LEN)?;

    let decoded = DecodedPayload {
        device_type: device_type(&reader)?,
        time: time(&reader)?,
        state_code: state(&reader)?,
        state_of_charge: state_of_charge(&reader)?,
        temperature: temperature(&reader)?,
    };
    debug!("decoded payload {payload}: {decoded:?}");
    Ok(decoded)
}

pub fn device_type(reader: &PayloadReader) -> Result<u8, PayloadError> {
    reader.read_low_nibble(layout::DEVICE_TYPE_OFFSET)
}

/// Reassemble the 36-bit timestamp as T5 ‖ T4 ‖ T3 ‖ T2 ‖ T1.
pub fn time(reader: &PayloadReader) -> Result<u64, PayloadError> {
    let t1 = reader.read_high_nibble(layout::TIME_T1_OFFSET)?;
    let t2 = reader.read_u8(layout::TIME_T2_OFFSET)?;
    let t3 = reader.read_u8(layout::TIME_T3_OFFSET)?;
    let t4 = reader.read_u8(layout::TIME_T4_OFFSET)?;
    let t5 = reader.read_low_nibble(layout::TIME_T5_OFFSET)?;

    let mut time = u64::from(t5);
    for fragment in [t4, t3, t2] {
        time = (time << layout::BYTE_BITS) | u64::from(fragment);
    }
    Ok((time << layout::NIBBLE_BITS) | u64::from(t1))
}

pub fn state(reader: &PayloadReader) -> Result<u8, PayloadError> {
    reader.read_high_nibble(layout::STATE_OFFSET)
}

pub fn state_of_charge(reader: &PayloadReader) -> Result<f64, PayloadError> {
    let raw = reader.read_u8(layout::STATE_OF_CHARGE_OFFSET)?;
    Ok(f64::from(raw) / layout::RAW_SCALE_DIVISOR)
}

pub fn temperature(reader: &PayloadReader) -> Result<f64, PayloadError> {
    let raw = reader.read_u8(layout::TEMPERATURE_OFFSET)?;
    Ok(f64::from(raw) / layout::RAW_SCALE_DIVISOR - layout::TEMPERATURE_BIAS_C)
}
