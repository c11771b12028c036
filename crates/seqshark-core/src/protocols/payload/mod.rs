//! Application payload decoding.
//!
//! Payloads arrive as hexadecimal text from the capture decoder. The feed
//! carries a big-endian 32-bit sequence number at a fixed byte offset; a short
//! frame starting with a known marker is a malformed variant of the feed.
//!
//! A payload that does not decode is not an error for the analysis: the
//! record simply carries no sequence number. `PayloadError` only explains why.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::{extract_sequence_number, has_marker, parse_sequence_number};
