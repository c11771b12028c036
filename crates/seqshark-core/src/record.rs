use serde::{Deserialize, Serialize};

/// One observed datagram as delivered by the capture decoder.
///
/// `sequence_number` is derived: it stays `None` until the engine annotates
/// the record, and for good when the payload does not carry one.
///
/// # Examples
/// ```
/// use seqshark_core::PacketRecord;
///
/// let record = PacketRecord::new(1, Some(1.5), "10.1.1.1", "239.50.1.1", 90, Some("00ff"));
/// assert_eq!(record.payload_hex.as_deref(), Some("00ff"));
/// assert!(record.sequence_number.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRecord {
    /// Capture frame number, display label only.
    pub frame_number: u64,
    /// Capture time in epoch seconds, when the decoder provided one.
    pub timestamp: Option<f64>,
    /// Display time exported by Wireshark, verbatim (relative seconds or a
    /// date string depending on the export settings).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_text: Option<String>,
    pub source: String,
    pub destination: String,
    /// Captured frame length in bytes.
    pub length: u64,
    pub payload_hex: Option<String>,
    #[serde(default)]
    pub sequence_number: Option<u32>,
}

impl PacketRecord {
    pub fn new(
        frame_number: u64,
        timestamp: Option<f64>,
        source: impl Into<String>,
        destination: impl Into<String>,
        length: u64,
        payload_hex: Option<&str>,
    ) -> Self {
        Self {
            frame_number,
            timestamp,
            time_text: None,
            source: source.into(),
            destination: destination.into(),
            length,
            payload_hex: payload_hex
                .map(str::trim)
                .filter(|hex| !hex.is_empty())
                .map(str::to_string),
            sequence_number: None,
        }
    }

    pub fn with_time_text(mut self, text: impl Into<String>) -> Self {
        self.time_text = Some(text.into());
        self
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload_hex.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::PacketRecord;

    #[test]
    fn empty_payload_is_absent() {
        let record = PacketRecord::new(7, None, "10.0.0.1", "239.50.0.1", 42, Some("  "));
        assert_eq!(record.payload(), None);
    }
}
