//! Payload decoding modules.
//!
//! Each decoder follows a layered structure:
//! - `layout`: offsets, widths and defaults (source of truth)
//! - `reader`: safe access to the hex-encoded payload text
//! - `parser`: domain-level decoding (no direct string indexing)
//! - `error`: explicit reasons a payload does not decode
//!
//! Parsers are pure and contain no I/O; sources and analysis layers handle
//! file access and aggregation.

pub mod payload;
