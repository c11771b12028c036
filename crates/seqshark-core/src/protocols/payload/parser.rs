use super::error::PayloadError;
use super::layout;
use super::reader::HexPayloadReader;

/// Decode the sequence number located `byte_offset` bytes into the payload.
pub fn parse_sequence_number(payload_hex: &str, byte_offset: usize) -> Result<u32, PayloadError> {
    let range = layout::sequence_hex_range(byte_offset)
        .ok_or(PayloadError::OffsetOutOfRange { offset: byte_offset })?;
    let reader = HexPayloadReader::new(payload_hex);
    reader.require_len(range.end)?;
    reader.read_u32_be(range)
}

/// Sequence number of a payload, or `None` when the payload does not carry one.
pub fn extract_sequence_number(payload_hex: Option<&str>, byte_offset: usize) -> Option<u32> {
    parse_sequence_number(payload_hex?, byte_offset).ok()
}

/// Whether the payload starts with `marker_hex`. An absent payload never does.
pub fn has_marker(payload_hex: Option<&str>, marker_hex: &str) -> bool {
    payload_hex.is_some_and(|hex| HexPayloadReader::new(hex).starts_with_ignore_case(marker_hex))
}
