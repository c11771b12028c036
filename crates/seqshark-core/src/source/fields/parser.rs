use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use csv::StringRecord;

use crate::record::PacketRecord;
use crate::source::{RecordSource, SkippedRows, SourceError};

use super::error::FieldsSourceError;
use super::layout;
use super::reader::{ColumnMap, field, normalize_payload, open_reader, read_columns};

pub struct FieldsSource<R> {
    reader: csv::Reader<R>,
    columns: ColumnMap,
    row: StringRecord,
    skipped: SkippedRows,
}

pub type FieldsFileSource = FieldsSource<BufReader<File>>;

impl FieldsSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: BufRead> FieldsSource<R> {
    /// Read the header row and build a source over the remaining rows.
    pub fn new(reader: R) -> Result<Self, SourceError> {
        let mut reader = open_reader(reader)?;
        let columns = read_columns(&mut reader)?;
        Ok(Self {
            reader,
            columns,
            row: StringRecord::new(),
            skipped: SkippedRows::default(),
        })
    }
}

impl<R: BufRead> RecordSource for FieldsSource<R> {
    fn next_record(&mut self) -> Result<Option<PacketRecord>, SourceError> {
        loop {
            match self.reader.read_record(&mut self.row) {
                Ok(true) => {}
                Ok(false) => return Ok(None),
                Err(err) if err.is_io_error() => return Err(FieldsSourceError::from(err).into()),
                Err(err) => {
                    log::debug!("skipping decoder row: {err}");
                    self.skipped.unparsable += 1;
                    continue;
                }
            }
            if self.row.iter().all(str::is_empty) {
                continue;
            }
            let line = self.row.position().map_or(0, |pos| pos.line());
            match parse_row(&self.columns, &self.row, line) {
                Ok(Some(record)) => return Ok(Some(record)),
                Ok(None) => self.skipped.non_udp += 1,
                Err(err) => {
                    log::debug!("skipping decoder row: {err}");
                    self.skipped.unparsable += 1;
                }
            }
        }
    }

    fn rows_skipped(&self) -> SkippedRows {
        self.skipped
    }
}

/// Parse one data row.
///
/// Returns `Ok(None)` when a protocol column is present and names something
/// other than UDP. An unreadable epoch time is kept as an absent timestamp;
/// a Wireshark display time is carried as text, never interpreted.
fn parse_row(
    columns: &ColumnMap,
    row: &StringRecord,
    line: u64,
) -> Result<Option<PacketRecord>, FieldsSourceError> {
    if let Some(protocol) = columns.protocol.map(|idx| field(row, idx)) {
        if !protocol.eq_ignore_ascii_case(layout::UDP_PROTOCOL) {
            return Ok(None);
        }
    }

    let frame_number = parse_number(row, columns.frame_number, line, layout::FRAME_NUMBER[0])?;
    let length = parse_number(row, columns.length, line, layout::LENGTH[0])?;
    let timestamp = columns
        .time_epoch
        .and_then(|idx| field(row, idx).parse::<f64>().ok())
        .filter(|ts| ts.is_finite());
    let time_text = columns
        .time_display
        .map(|idx| field(row, idx))
        .filter(|text| !text.is_empty());
    let payload = columns
        .data
        .and_then(|idx| normalize_payload(field(row, idx)));

    let record = PacketRecord::new(
        frame_number,
        timestamp,
        field(row, columns.source),
        field(row, columns.destination),
        length,
        payload.as_deref(),
    );
    Ok(Some(match time_text {
        Some(text) => record.with_time_text(text),
        None => record,
    }))
}

fn parse_number(
    row: &StringRecord,
    index: usize,
    line: u64,
    column: &'static str,
) -> Result<u64, FieldsSourceError> {
    let value = field(row, index);
    value.parse().map_err(|_| FieldsSourceError::InvalidValue {
        line,
        column,
        value: value.to_string(),
    })
}
