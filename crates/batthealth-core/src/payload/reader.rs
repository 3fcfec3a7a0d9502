use hex::FromHexError;

use super::error::PayloadError;
use super::layout;

/// Byte-addressed view over a hex-encoded payload.
///
/// Whole byte pairs are decoded up front, at most `PAYLOAD_BYTES` of them; a
/// trailing odd digit is ignored. A bad digit is reported with its byte
/// offset and character index.
pub struct PayloadReader {
    bytes: [u8; layout::PAYLOAD_BYTES],
    len: usize,
}

impl PayloadReader {
    pub fn new(payload: &str) -> Result<Self, PayloadError> {
        let len = (payload.len() / layout::HEX_CHARS_PER_BYTE).min(layout::PAYLOAD_BYTES);
        let digits = &payload.as_bytes()[..len * layout::HEX_CHARS_PER_BYTE];

        let mut bytes = [0u8; layout::PAYLOAD_BYTES];
        hex::decode_to_slice(digits, &mut bytes[..len])
            .map_err(|err| hex_error(payload, len, err))?;
        Ok(Self { bytes, len })
    }

    /// Number of whole bytes available in the hex text.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn require_len(&self, needed: usize) -> Result<(), PayloadError> {
        if self.len < needed {
            return Err(PayloadError::TooShort {
                needed,
                actual: self.len,
            });
        }
        Ok(())
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, PayloadError> {
        self.bytes[..self.len]
            .get(offset)
            .copied()
            .ok_or(PayloadError::TooShort {
                needed: offset + 1,
                actual: self.len,
            })
    }

    pub fn read_low_nibble(&self, offset: usize) -> Result<u8, PayloadError> {
        Ok(self.read_u8(offset)? & layout::NIBBLE_MASK)
    }

    pub fn read_high_nibble(&self, offset: usize) -> Result<u8, PayloadError> {
        Ok((self.read_u8(offset)? >> layout::NIBBLE_BITS) & layout::NIBBLE_MASK)
    }
}

fn hex_error(payload: &str, len: usize, err: FromHexError) -> PayloadError {
    match err {
        FromHexError::InvalidHexCharacter { index, .. } => PayloadError::InvalidHex {
            offset: index / layout::HEX_CHARS_PER_BYTE,
            index,
            character: char_at(payload, index),
        },
        // The digit slice is always even and sized to the output buffer.
        FromHexError::OddLength | FromHexError::InvalidStringLength => PayloadError::TooShort {
            needed: len,
            actual: payload.len() / layout::HEX_CHARS_PER_BYTE,
        },
    }
}

/// `hex` reports the raw byte; recover the full character for non-ASCII text.
fn char_at(payload: &str, index: usize) -> char {
    payload
        .get(index..)
        .and_then(|rest| rest.chars().next())
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

#[cfg(test)]
mod tests {
    use super::PayloadReader;
    use crate::payload::error::PayloadError;

    #[test]
    fn read_u8_is_case_insensitive() {
        let reader = PayloadReader::new("fFa0").unwrap();
        assert_eq!(reader.read_u8(0).unwrap(), 0xFF);
        assert_eq!(reader.read_u8(1).unwrap(), 0xA0);
    }

    #[test]
    fn read_nibbles() {
        let reader = PayloadReader::new("F1").unwrap();
        assert_eq!(reader.read_high_nibble(0).unwrap(), 0xF);
        assert_eq!(reader.read_low_nibble(0).unwrap(), 0x1);
    }

    #[test]
    fn len_counts_whole_bytes() {
        assert!(PayloadReader::new("").unwrap().is_empty());
        assert_eq!(PayloadReader::new("ABC").unwrap().len(), 1);
        assert_eq!(PayloadReader::new("F1E6E63676C75000").unwrap().len(), 8);
        assert_eq!(PayloadReader::new("F1E6E63676C75000FF").unwrap().len(), 8);
    }

    #[test]
    fn read_past_end_is_too_short() {
        let reader = PayloadReader::new("F1E").unwrap();
        let err = reader.read_u8(1).unwrap_err();
        assert_eq!(
            err,
            PayloadError::TooShort {
                needed: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn invalid_digit_names_byte_position() {
        let err = PayloadReader::new("00112G").err().unwrap();
        assert_eq!(
            err,
            PayloadError::InvalidHex {
                offset: 2,
                index: 5,
                character: 'G'
            }
        );
    }

    #[test]
    fn sign_prefix_is_not_a_digit() {
        assert!(matches!(
            PayloadReader::new("+F"),
            Err(PayloadError::InvalidHex { index: 0, .. })
        ));
    }

    #[test]
    fn non_ascii_digit_is_rejected() {
        let err = PayloadReader::new("é0").err().unwrap();
        assert!(matches!(
            err,
            PayloadError::InvalidHex {
                offset: 0,
                index: 0,
                character: 'é'
            }
        ));
    }

    #[test]
    fn require_len_reports_sizes() {
        let reader = PayloadReader::new("0011").unwrap();
        assert!(reader.require_len(2).is_ok());
        let err = reader.require_len(7).unwrap_err();
        assert!(err.to_string().contains("need 7 bytes, got 2"));
    }
}
