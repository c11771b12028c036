//! SeqShark core library for multicast sequence-integrity analysis.
//!
//! This crate implements the offline analysis pipeline used by the CLI:
//! record sources feed decoded packet records to the engine, which drops
//! malformed records, extracts the payload sequence number, buckets records
//! per (destination group, source) and reports gaps and duplicates in a
//! deterministic report. Payload decoding is side-effect free; all I/O,
//! including the external capture decoder, is isolated in `source` modules.
//!
//! Invariants:
//! - Report outputs are deterministic and stable across runs.
//! - Every accepted, selected record lands in exactly one bucket or in the
//!   unsequenced set.
//! - Buckets are walked in sequence-number order, never capture order.
//! - Record-level problems are report data; only configuration and decoder
//!   failures are errors.
//!
//! Known limitation: sequence numbers are 32-bit and wraparound is not
//! corrected. A wrapped feed shows up as one very large gap.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use seqshark_core::{AnalysisOptions, Engine, EngineConfig, analyze_capture_file};
//!
//! let engine = Engine::new(EngineConfig::default())?;
//! let report = analyze_capture_file(Path::new("capture.csv"), &engine, &AnalysisOptions::default())?;
//! println!("report version: {}", report.report_version);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

mod analysis;
mod config;
mod protocols;
mod record;
mod source;

pub use analysis::{
    AnalysisError, AnalysisOptions, BucketKey, FilterOutcome, GroupSelection, Partition,
    analyze_capture_file, analyze_records, analyze_source, annotate_sequence_numbers,
    available_groups, describe_gaps, filter_malformed, malformed_reason, partition_records,
};
pub use config::{ConfigError, Engine, EngineConfig};
pub use protocols::payload::extract_sequence_number;
pub use record::PacketRecord;
pub use source::{
    FieldsFileSource, FieldsSource, MemorySource, RecordSource, SkippedRows, SourceError,
    TsharkDecoder, open_capture,
};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when no capture time is available.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Sequence-integrity report with deterministic ordering.
///
/// # Examples
/// ```
/// use seqshark_core::make_stub_report;
///
/// let report = make_stub_report("capture.csv", 123);
/// assert_eq!(report.report_version, seqshark_core::REPORT_VERSION);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 timestamp representing the report generation time.
    pub generated_at: String,

    /// Input capture metadata.
    pub input: InputInfo,
    /// Engine configuration the report was produced with.
    pub config: EngineConfig,

    /// Record counts and capture time bounds.
    pub capture_summary: CaptureSummary,
    /// Destination groups analysed, sorted.
    pub groups: Vec<String>,
    /// Accepted records with their sequence numbers, in capture order.
    pub packets: Vec<PacketRow>,
    /// One row per bucket (or per empty selected group), sorted.
    pub summary: Vec<SummaryRow>,
    /// Malformed audit table, present only when requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub malformed: Vec<MalformedRow>,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use seqshark_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "seqshark".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "seqshark");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "seqshark").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input capture metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the analyzer.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}

/// Record counts for one run.
///
/// `records_total = records_accepted + records_malformed`; decoder rows that
/// never became records are counted separately.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Records delivered by the decoder.
    pub records_total: u64,
    /// Records that passed the malformed-packet filter.
    pub records_accepted: u64,
    /// Records excluded as malformed.
    pub records_malformed: u64,
    /// Selected records whose payload carries no sequence number.
    pub records_unsequenced: u64,
    /// Accepted records whose group was not selected.
    pub records_outside_selection: u64,
    /// Decoder rows that could not be turned into a record.
    pub rows_skipped: u64,
    /// Decoder rows dropped because their protocol was not UDP.
    pub rows_non_udp: u64,
    /// RFC3339 timestamp of the first record (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the last record (if known).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}

/// One row of the enriched packet table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketRow {
    /// Capture frame number ("No.").
    pub frame_number: u64,
    /// Capture time: the decoder's display text when it has one, else RFC3339.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Capture time in epoch seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    pub source: String,
    pub destination: String,
    pub length: u64,
    /// Hex payload ("Data").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<u32>,
}

/// Per-bucket summary row.
///
/// # Examples
/// ```
/// use seqshark_core::{BucketStatus, SummaryRow};
///
/// let row = SummaryRow {
///     destination: "239.50.1.1".to_string(),
///     source: Some("10.1.1.1".to_string()),
///     total_packets: 5,
///     status: BucketStatus::InOrder,
///     sequence_info: "-".to_string(),
///     gap_count: 0,
///     duplicate_count: 0,
///     missing_packets: 0,
///     reordered_packets: 0,
///     first_sequence: Some(1),
///     last_sequence: Some(5),
///     gaps: Vec::new(),
/// };
/// assert_eq!(row.status.to_string(), "in-order");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Destination multicast group.
    pub destination: String,
    /// Source address; absent for a selected group without packets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Packets that took part in sequence analysis.
    pub total_packets: u64,
    pub status: BucketStatus,
    /// `Expected E, got A, No. F` for every event, `; `-separated, or `-`.
    pub sequence_info: String,
    /// Forward gaps (`missing > 0`).
    pub gap_count: u64,
    /// Repeated sequence numbers (`missing == -1`).
    pub duplicate_count: u64,
    /// Sum of `missing` over forward gaps.
    pub missing_packets: u64,
    /// Packets that arrived after a higher sequence number (informational).
    pub reordered_packets: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_sequence: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sequence: Option<u32>,
    /// Every detected event, in sequence order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gaps: Vec<GapEvent>,
}

/// Terminal status of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BucketStatus {
    InOrder,
    AnomaliesDetected,
    NoPackets,
}

impl fmt::Display for BucketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InOrder => "in-order",
            Self::AnomaliesDetected => "anomalies-detected",
            Self::NoPackets => "no-packets",
        };
        f.write_str(label)
    }
}

/// One discontinuity found while walking a bucket.
///
/// `expected` is `previous + 1` computed without wrapping, so it can reach
/// 2^32; `missing = actual - expected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapEvent {
    /// Frame number of the packet where the discontinuity was observed.
    pub frame_number: u64,
    pub expected: u64,
    pub actual: u32,
    pub missing: i64,
    pub kind: GapKind,
}

/// Anomaly class of a `GapEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapKind {
    /// Forward discontinuity, likely loss.
    Gap,
    /// Repeated sequence number, redelivery rather than loss.
    Duplicate,
}

impl GapKind {
    /// Classify a `missing` value from a sequence-ordered walk.
    ///
    /// # Examples
    /// ```
    /// use seqshark_core::GapKind;
    ///
    /// assert_eq!(GapKind::from_missing(3), GapKind::Gap);
    /// assert_eq!(GapKind::from_missing(-1), GapKind::Duplicate);
    /// ```
    pub fn from_missing(missing: i64) -> Self {
        if missing < 0 { Self::Duplicate } else { Self::Gap }
    }
}

impl fmt::Display for GapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gap => f.write_str("gap"),
            Self::Duplicate => f.write_str("duplicate"),
        }
    }
}

/// Why a record was excluded by the malformed-packet filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedReason {
    /// Destination outside the configured multicast prefix.
    ForeignDestination,
    /// Short frame whose payload starts with the malformed marker.
    ShortMarkedFrame,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForeignDestination => f.write_str("foreign-destination"),
            Self::ShortMarkedFrame => f.write_str("short-marked-frame"),
        }
    }
}

/// One row of the malformed audit table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MalformedRow {
    pub frame_number: u64,
    pub source: String,
    pub destination: String,
    pub length: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    pub reason: MalformedReason,
}

/// Build a stub report with base fields filled and empty tables.
///
/// # Examples
/// ```
/// use seqshark_core::make_stub_report;
///
/// let report = make_stub_report("capture.csv", 123);
/// assert_eq!(report.input.bytes, 123);
/// assert!(report.summary.is_empty());
/// ```
pub fn make_stub_report(input_path: &str, input_bytes: u64) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "seqshark".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at: DEFAULT_GENERATED_AT.to_string(),
        input: InputInfo {
            path: input_path.to_string(),
            bytes: input_bytes,
        },
        config: EngineConfig::default(),
        capture_summary: CaptureSummary::default(),
        groups: vec![],
        packets: vec![],
        summary: vec![],
        malformed: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_omits_optional_fields_when_none() {
        let mut report = make_stub_report("capture.csv", 1);
        report.packets.push(PacketRow {
            frame_number: 1,
            time: None,
            timestamp: None,
            source: "10.0.0.1".to_string(),
            destination: "239.50.0.1".to_string(),
            length: 60,
            data: None,
            sequence_number: None,
        });
        report.summary.push(SummaryRow {
            destination: "239.50.0.2".to_string(),
            source: None,
            total_packets: 0,
            status: BucketStatus::NoPackets,
            sequence_info: "-".to_string(),
            gap_count: 0,
            duplicate_count: 0,
            missing_packets: 0,
            reordered_packets: 0,
            first_sequence: None,
            last_sequence: None,
            gaps: vec![],
        });

        let value = serde_json::to_value(&report).expect("report json");
        assert!(value.get("malformed").is_none());
        let capture = &value["capture_summary"];
        assert!(capture.get("time_start").is_none());
        assert!(capture.get("time_end").is_none());

        let packet = &value["packets"][0];
        assert!(packet.get("time").is_none());
        assert!(packet.get("data").is_none());
        assert!(packet.get("sequence_number").is_none());

        let row = &value["summary"][0];
        assert!(row.get("source").is_none());
        assert!(row.get("gaps").is_none());
        assert_eq!(row["status"], "no-packets");
    }

    #[test]
    fn labels_are_kebab_case() {
        assert_eq!(
            serde_json::to_value(BucketStatus::AnomaliesDetected).unwrap(),
            "anomalies-detected"
        );
        assert_eq!(serde_json::to_value(GapKind::Duplicate).unwrap(), "duplicate");
        assert_eq!(
            serde_json::to_value(MalformedReason::ShortMarkedFrame).unwrap(),
            "short-marked-frame"
        );
        assert_eq!(MalformedReason::ForeignDestination.to_string(), "foreign-destination");
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = make_stub_report("capture.csv", 10);
        let json = serde_json::to_string(&report).unwrap();
        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.input.path, "capture.csv");
        assert_eq!(parsed.config, EngineConfig::default());
    }
}
