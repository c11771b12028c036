use std::path::Path;

use rayon::prelude::*;
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::config::{ConfigError, Engine};
use crate::record::PacketRecord;
use crate::source::{RecordSource, SourceError, TsharkDecoder, open_capture};
use crate::{BucketStatus, CaptureSummary, DEFAULT_GENERATED_AT, Report, make_stub_report};

mod filter;
mod integrity;
mod partition;
mod summary;

pub use filter::{FilterOutcome, filter_malformed, malformed_reason};
pub use partition::{BucketKey, GroupSelection, Partition, available_groups, partition_records};
pub use summary::describe_gaps;

use integrity::{BucketAnalysis, analyze_bucket};
use summary::{build_malformed_rows, build_packet_rows, build_summary_rows};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Caller choices that are not engine configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub selection: GroupSelection,
    /// Carry the malformed audit table in the report.
    pub keep_malformed: bool,
    pub decoder: TsharkDecoder,
}

/// Analyse a capture file or decoder export and build the report.
pub fn analyze_capture_file(
    path: &Path,
    engine: &Engine,
    options: &AnalysisOptions,
) -> Result<Report, AnalysisError> {
    let source = open_capture(path, &options.decoder)?;
    analyze_source(path, source, engine, options)
}

pub fn analyze_source<S: RecordSource>(
    path: &Path,
    mut source: S,
    engine: &Engine,
    options: &AnalysisOptions,
) -> Result<Report, AnalysisError> {
    let mut records = Vec::new();
    while let Some(record) = source.next_record()? {
        records.push(record);
    }
    let skipped = source.rows_skipped();
    if skipped.unparsable > 0 {
        log::warn!(
            "{}: skipped {} undecodable decoder rows",
            path.display(),
            skipped.unparsable
        );
    }

    let mut report = analyze_records(records, engine, options);
    report.input.path = path.display().to_string();
    report.input.bytes = path.metadata()?.len();
    report.capture_summary.rows_skipped = skipped.unparsable;
    report.capture_summary.rows_non_udp = skipped.non_udp;
    Ok(report)
}

/// Run the whole engine over already-decoded records.
///
/// Record-level problems never fail the run: malformed records are set
/// aside, undecodable payloads are counted, and anomalies are report data.
///
/// # Examples
/// ```
/// use seqshark_core::{AnalysisOptions, BucketStatus, Engine, EngineConfig, PacketRecord, analyze_records};
///
/// let engine = Engine::new(EngineConfig::default()).unwrap();
/// let records = [1u32, 2, 4]
///     .iter()
///     .enumerate()
///     .map(|(idx, seq)| {
///         let payload = format!("{}{:08x}", "00".repeat(10), seq);
///         PacketRecord::new(idx as u64 + 1, None, "10.1.1.1", "239.50.1.1", 100, Some(&payload))
///     })
///     .collect();
///
/// let report = analyze_records(records, &engine, &AnalysisOptions::default());
/// assert_eq!(report.summary[0].status, BucketStatus::AnomaliesDetected);
/// assert_eq!(report.summary[0].sequence_info, "Expected 3, got 4, No. 3");
/// ```
pub fn analyze_records(
    records: Vec<PacketRecord>,
    engine: &Engine,
    options: &AnalysisOptions,
) -> Report {
    let records_total = records.len() as u64;
    let (time_start, time_end) = ts_bounds(&records);

    let FilterOutcome {
        mut accepted,
        malformed,
    } = filter_malformed(engine, records);
    annotate_sequence_numbers(engine, &mut accepted);

    let partition = partition_records(&accepted, &options.selection);
    for group in &partition.empty_groups {
        log::warn!("no packets found for group {group}");
    }

    let buckets: Vec<(&BucketKey, &Vec<&PacketRecord>)> = partition.buckets.iter().collect();
    let results: Vec<(BucketKey, BucketAnalysis)> = buckets
        .par_iter()
        .map(|(key, records)| ((*key).clone(), analyze_bucket(records)))
        .collect();
    log_bucket_results(&results);

    let groups = match &options.selection {
        GroupSelection::All => available_groups(&accepted),
        GroupSelection::Only(groups) => groups.iter().cloned().collect(),
    };

    let mut report = make_stub_report("", 0);
    report.config = engine.config().clone();
    report.capture_summary = CaptureSummary {
        records_total,
        records_accepted: accepted.len() as u64,
        records_malformed: malformed.len() as u64,
        records_unsequenced: partition.unsequenced.len() as u64,
        records_outside_selection: partition.outside_selection as u64,
        rows_skipped: 0,
        rows_non_udp: 0,
        time_start: ts_to_rfc3339(time_start),
        time_end: ts_to_rfc3339(time_end),
    };
    report.generated_at = report
        .capture_summary
        .time_end
        .clone()
        .or_else(|| report.capture_summary.time_start.clone())
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    report.groups = groups;
    report.summary = build_summary_rows(results, &partition.empty_groups);
    report.packets = build_packet_rows(&accepted);
    if options.keep_malformed {
        report.malformed = build_malformed_rows(&malformed);
    }
    report
}

/// Attach the payload-derived sequence number to each record.
pub fn annotate_sequence_numbers(engine: &Engine, records: &mut [PacketRecord]) {
    for record in records.iter_mut() {
        record.sequence_number = engine.sequence_number(record.payload());
        if record.sequence_number.is_none() {
            log::debug!("frame {}: no sequence number in payload", record.frame_number);
        }
    }
}

fn log_bucket_results(results: &[(BucketKey, BucketAnalysis)]) {
    for (key, analysis) in results {
        match analysis.status {
            BucketStatus::InOrder => log::info!(
                "{} from {}: all {} sequence numbers in order",
                key.destination,
                key.source,
                analysis.packets
            ),
            BucketStatus::NoPackets => log::warn!(
                "{} from {}: no sequenced packets",
                key.destination,
                key.source
            ),
            BucketStatus::AnomaliesDetected => {
                for gap in &analysis.gaps {
                    log::info!(
                        "{} from {}: No. {}: expected {}, got {} ({} {})",
                        key.destination,
                        key.source,
                        gap.frame_number,
                        gap.expected,
                        gap.actual,
                        gap.missing,
                        gap.kind
                    );
                }
            }
        }
    }
}

fn ts_bounds(records: &[PacketRecord]) -> (Option<f64>, Option<f64>) {
    let mut first = None;
    let mut last = None;
    for ts in records.iter().filter_map(|record| record.timestamp) {
        update_ts_bounds(&mut first, &mut last, ts);
    }
    (first, last)
}

fn update_ts_bounds(first: &mut Option<f64>, last: &mut Option<f64>, ts: f64) {
    match first {
        Some(existing) if *existing <= ts => {}
        _ => *first = Some(ts),
    }
    match last {
        Some(existing) if *existing >= ts => {}
        _ => *last = Some(ts),
    }
}

pub(crate) fn ts_to_rfc3339(ts: Option<f64>) -> Option<String> {
    let ts = ts?;
    if !ts.is_finite() {
        return None;
    }
    let secs = ts.floor();
    let nanos = ((ts - secs) * 1_000_000_000.0).round() as i128;
    let total = (secs as i128)
        .checked_mul(1_000_000_000)?
        .checked_add(nanos)?;
    OffsetDateTime::from_unix_timestamp_nanos(total)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}
