//! Column names accepted in the header row.
//!
//! Each column lists its tshark field name first, then the Wireshark display
//! column name.

pub const UDP_PROTOCOL: &str = "UDP";
pub const UTF8_BOM: &[u8] = &[0xef, 0xbb, 0xbf];

pub const FRAME_NUMBER: &[&str] = &["frame.number", "No."];
/// Epoch seconds; only tshark emits this column.
pub const TIME_EPOCH: &[&str] = &["frame.time_epoch"];
/// Wireshark display time, in whatever format the export was made with.
pub const TIME_DISPLAY: &[&str] = &["Time"];
pub const SOURCE: &[&str] = &["ip.src", "ipv6.src", "Source"];
pub const DESTINATION: &[&str] = &["ip.dst", "ipv6.dst", "Destination"];
pub const LENGTH: &[&str] = &["frame.len", "Length"];
pub const DATA: &[&str] = &["data.data", "data", "Data"];
pub const PROTOCOL: &[&str] = &["_ws.col.Protocol", "Protocol"];

/// Fields requested from tshark, in column order.
pub const TSHARK_FIELDS: [&str; 6] = [
    "frame.number",
    "frame.time_epoch",
    "ip.src",
    "ip.dst",
    "frame.len",
    "data.data",
];
