//! Decoder fields-export source.
//!
//! This module provides a `RecordSource` backed by the delimited text the
//! capture decoder emits (tshark `-T fields` output or a Wireshark CSV
//! export). The header row decides the column mapping; rows that cannot be
//! turned into a record are skipped and counted, never fatal.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::{FieldsFileSource, FieldsSource};
