use std::ops::Range;

use super::error::PayloadError;

pub struct HexPayloadReader<'a> {
    hex: &'a str,
}

impl<'a> HexPayloadReader<'a> {
    pub fn new(hex: &'a str) -> Self {
        Self { hex }
    }

    pub fn require_len(&self, needed: usize) -> Result<(), PayloadError> {
        if self.hex.len() < needed {
            return Err(PayloadError::TooShort {
                needed,
                actual: self.hex.len(),
            });
        }
        Ok(())
    }

    pub fn read_slice(&self, range: Range<usize>) -> Result<&'a str, PayloadError> {
        self.require_len(range.end)?;
        self.hex.get(range.clone()).ok_or(PayloadError::InvalidHex {
            start: range.start,
            end: range.end,
        })
    }

    /// Read a big-endian `u32` from eight hex characters.
    pub fn read_u32_be(&self, range: Range<usize>) -> Result<u32, PayloadError> {
        let digits = self.read_slice(range.clone())?;
        // from_str_radix tolerates a leading sign, the wire format does not.
        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PayloadError::InvalidHex {
                start: range.start,
                end: range.end,
            });
        }
        u32::from_str_radix(digits, 16).map_err(|_| PayloadError::InvalidHex {
            start: range.start,
            end: range.end,
        })
    }

    pub fn starts_with_ignore_case(&self, prefix: &str) -> bool {
        self.hex
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::HexPayloadReader;
    use crate::protocols::payload::error::PayloadError;

    #[test]
    fn read_u32_be_ok() {
        let reader = HexPayloadReader::new("0000007B");
        assert_eq!(reader.read_u32_be(0..8), Ok(123));
    }

    #[test]
    fn read_u32_be_rejects_sign() {
        let reader = HexPayloadReader::new("+000007B");
        assert!(matches!(
            reader.read_u32_be(0..8),
            Err(PayloadError::InvalidHex { .. })
        ));
    }

    #[test]
    fn read_slice_too_short() {
        let reader = HexPayloadReader::new("0011");
        let err = reader.read_slice(0..8).unwrap_err();
        assert_eq!(
            err,
            PayloadError::TooShort {
                needed: 8,
                actual: 4
            }
        );
    }

    #[test]
    fn read_slice_non_ascii_boundary() {
        let reader = HexPayloadReader::new("é0000000");
        assert!(matches!(
            reader.read_slice(1..9),
            Err(PayloadError::InvalidHex { .. })
        ));
    }

    #[test]
    fn prefix_match_ignores_case() {
        let reader = HexPayloadReader::new("3A00ff");
        assert!(reader.starts_with_ignore_case("3a00"));
        assert!(!reader.starts_with_ignore_case("3100"));
        assert!(!HexPayloadReader::new("3").starts_with_ignore_case("3100"));
    }
}
