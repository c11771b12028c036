use std::ops::Range;

pub const HEX_CHARS_PER_BYTE: usize = 2;
pub const SEQUENCE_LEN: usize = 4;

pub const DEFAULT_SEQUENCE_OFFSET: usize = 10;
pub const DEFAULT_MALFORMED_MARKER: &str = "3100";
pub const DEFAULT_MALFORMED_MAX_LENGTH: u64 = 65;
pub const DEFAULT_MULTICAST_PREFIX: &str = "239.50.";

/// Hex character range of the sequence field for a given byte offset.
///
/// Returns `None` when the range does not fit in `usize`.
pub fn sequence_hex_range(byte_offset: usize) -> Option<Range<usize>> {
    let start = byte_offset.checked_mul(HEX_CHARS_PER_BYTE)?;
    let end = byte_offset
        .checked_add(SEQUENCE_LEN)?
        .checked_mul(HEX_CHARS_PER_BYTE)?;
    Some(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_offset_covers_hex_20_to_28() {
        assert_eq!(sequence_hex_range(DEFAULT_SEQUENCE_OFFSET), Some(20..28));
    }

    #[test]
    fn huge_offset_overflows() {
        assert_eq!(sequence_hex_range(usize::MAX / 2), None);
    }
}
