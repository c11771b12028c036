use std::io::{BufRead, Read};

use csv::{ReaderBuilder, StringRecord, Trim};

use super::error::FieldsSourceError;
use super::layout;

/// CSV reader over decoder text: header row, ragged rows allowed, fields trimmed.
///
/// A leading UTF-8 byte-order mark (Excel and Wireshark on Windows write one)
/// is dropped before the header is parsed.
pub fn open_reader<R: BufRead>(mut reader: R) -> Result<csv::Reader<R>, FieldsSourceError> {
    if reader.fill_buf()?.starts_with(layout::UTF8_BOM) {
        reader.consume(layout::UTF8_BOM.len());
    }
    Ok(ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader))
}

/// Header positions of the columns the source reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub frame_number: usize,
    pub time_epoch: Option<usize>,
    pub time_display: Option<usize>,
    pub source: usize,
    pub destination: usize,
    pub length: usize,
    pub data: Option<usize>,
    pub protocol: Option<usize>,
}

impl ColumnMap {
    pub fn from_header(header: &StringRecord) -> Result<Self, FieldsSourceError> {
        if header.iter().all(str::is_empty) {
            return Err(FieldsSourceError::MissingHeader);
        }
        let find = |aliases: &[&str]| {
            header
                .iter()
                .position(|name| aliases.iter().any(|alias| alias.eq_ignore_ascii_case(name)))
        };
        let require = |aliases: &[&'static str]| {
            find(aliases).ok_or(FieldsSourceError::MissingColumn { column: aliases[0] })
        };

        Ok(Self {
            frame_number: require(layout::FRAME_NUMBER)?,
            time_epoch: find(layout::TIME_EPOCH),
            time_display: find(layout::TIME_DISPLAY),
            source: require(layout::SOURCE)?,
            destination: require(layout::DESTINATION)?,
            length: require(layout::LENGTH)?,
            data: find(layout::DATA),
            protocol: find(layout::PROTOCOL),
        })
    }
}

/// Read the header of `reader` and map it.
pub fn read_columns<R: Read>(reader: &mut csv::Reader<R>) -> Result<ColumnMap, FieldsSourceError> {
    ColumnMap::from_header(reader.headers()?)
}

/// Field at `index`; missing trailing fields read as empty.
pub fn field(row: &StringRecord, index: usize) -> &str {
    row.get(index).unwrap_or("")
}

/// Normalise a decoder payload: drop byte separators, empty means absent.
pub fn normalize_payload(raw: &str) -> Option<String> {
    let hex: String = raw.trim().chars().filter(|c| *c != ':').collect();
    if hex.is_empty() { None } else { Some(hex) }
}
