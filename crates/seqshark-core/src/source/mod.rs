mod fields;
mod tshark;

pub use fields::{FieldsFileSource, FieldsSource};
pub use tshark::TsharkDecoder;

use std::path::Path;

use thiserror::Error;

use crate::record::PacketRecord;

pub trait RecordSource {
    fn next_record(&mut self) -> Result<Option<PacketRecord>, SourceError>;

    /// Decoder rows dropped before they became records.
    fn rows_skipped(&self) -> SkippedRows {
        SkippedRows::default()
    }
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn next_record(&mut self) -> Result<Option<PacketRecord>, SourceError> {
        (**self).next_record()
    }

    fn rows_skipped(&self) -> SkippedRows {
        (**self).rows_skipped()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkippedRows {
    /// Rows whose frame number or length did not parse.
    pub unparsable: u64,
    /// Rows whose protocol column was not UDP.
    pub non_udp: u64,
}

/// Records already decoded in memory, replayed in order.
#[derive(Debug, Default)]
pub struct MemorySource {
    records: std::vec::IntoIter<PacketRecord>,
}

impl From<Vec<PacketRecord>> for MemorySource {
    fn from(records: Vec<PacketRecord>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }
}

impl RecordSource for MemorySource {
    fn next_record(&mut self) -> Result<Option<PacketRecord>, SourceError> {
        Ok(self.records.next())
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("fields parse error: {0}")]
    Fields(String),
    #[error("capture decoder failed: {0}")]
    Decoder(String),
}

impl From<fields::error::FieldsSourceError> for SourceError {
    fn from(value: fields::error::FieldsSourceError) -> Self {
        match value {
            fields::error::FieldsSourceError::Io(err) => SourceError::Io(err),
            other => SourceError::Fields(other.to_string()),
        }
    }
}

/// Open a record source for `path`.
///
/// Binary captures (`.pcap`, `.pcapng`) go through the external decoder;
/// anything else is read as a decoder fields export.
pub fn open_capture(
    path: &Path,
    decoder: &TsharkDecoder,
) -> Result<Box<dyn RecordSource>, SourceError> {
    if is_binary_capture(path) {
        Ok(Box::new(decoder.decode(path)?))
    } else {
        Ok(Box::new(FieldsFileSource::open(path)?))
    }
}

fn is_binary_capture(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pcap") || ext.eq_ignore_ascii_case("pcapng"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::{MemorySource, RecordSource, is_binary_capture};
    use crate::record::PacketRecord;
    use std::path::Path;

    #[test]
    fn binary_capture_by_extension() {
        assert!(is_binary_capture(Path::new("a.pcap")));
        assert!(is_binary_capture(Path::new("a.PCAPNG")));
        assert!(!is_binary_capture(Path::new("a.csv")));
        assert!(!is_binary_capture(Path::new("pcap")));
    }

    #[test]
    fn memory_source_replays_in_order() {
        let records = vec![
            PacketRecord::new(2, None, "a", "b", 1, None),
            PacketRecord::new(1, None, "a", "b", 1, None),
        ];
        let mut source = MemorySource::from(records);
        assert_eq!(source.next_record().unwrap().unwrap().frame_number, 2);
        assert_eq!(source.next_record().unwrap().unwrap().frame_number, 1);
        assert!(source.next_record().unwrap().is_none());
    }
}
