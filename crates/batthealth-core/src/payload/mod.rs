//! Battery status payload decoding.
//!
//! The payload is eight bytes carried as 16 hex digits. Fields sit at fixed
//! byte offsets, some sharing a byte by nibble:
//! - byte 0: device type (low nibble), time fragment T1 (high nibble)
//! - bytes 1..=3: time fragments T2, T3, T4
//! - byte 4: time fragment T5 (low nibble), state code (high nibble)
//! - byte 5: state of charge, raw / 2
//! - byte 6: temperature, raw / 2 - 20
//!
//! The 36-bit time is rebuilt as T5 ‖ T4 ‖ T3 ‖ T2 ‖ T1, T5 being the most
//! significant nibble. Offsets live in `layout`, hex access in `reader`, and
//! field decoding in `parser`. Parsers do no range checks; see
//! `crate::validation`.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::{DecodedPayload, decode_payload};
