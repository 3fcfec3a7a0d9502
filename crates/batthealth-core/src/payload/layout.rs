pub const PAYLOAD_BYTES: usize = 8;
pub const HEX_CHARS_PER_BYTE: usize = 2;
pub const PAYLOAD_HEX_LEN: usize = PAYLOAD_BYTES * HEX_CHARS_PER_BYTE;

pub const DEVICE_TYPE_OFFSET: usize = 0;

// Time fragments, least significant first: T1 (high nibble), T2, T3, T4, T5 (low nibble).
pub const TIME_T1_OFFSET: usize = 0;
pub const TIME_T2_OFFSET: usize = 1;
pub const TIME_T3_OFFSET: usize = 2;
pub const TIME_T4_OFFSET: usize = 3;
pub const TIME_T5_OFFSET: usize = 4;

pub const STATE_OFFSET: usize = 4;
pub const STATE_OF_CHARGE_OFFSET: usize = 5;
pub const TEMPERATURE_OFFSET: usize = 6;

/// Bytes a full decode touches; byte 7 is reserved.
pub const MIN_LEN: usize = TEMPERATURE_OFFSET + 1;

pub const NIBBLE_MASK: u8 = 0x0F;
pub const NIBBLE_BITS: u32 = 4;
pub const BYTE_BITS: u32 = 8;
pub const TIME_BITS: u32 = 2 * NIBBLE_BITS + 3 * BYTE_BITS;

pub const RAW_SCALE_DIVISOR: f64 = 2.0;
pub const TEMPERATURE_BIAS_C: f64 = 20.0;
