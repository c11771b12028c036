use thiserror::Error;

/// Reasons a payload carries no sequence number.
///
/// Note: this error type lives in an internal module; the example is
/// illustrative and not compiled as a public doctest.
///
/// # Examples
/// ```text
/// use seqshark_core::protocols::payload::error::PayloadError;
///
/// let err = PayloadError::TooShort { needed: 28, actual: 4 };
/// assert!(err.to_string().contains("payload too short"));
/// ```
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload too short: need {needed} hex chars, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("invalid hex at chars {start}..{end}")]
    InvalidHex { start: usize, end: usize },
    #[error("sequence offset {offset} out of range")]
    OffsetOutOfRange { offset: usize },
}
