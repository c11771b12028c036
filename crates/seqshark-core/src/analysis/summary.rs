use crate::record::PacketRecord;
use crate::{BucketStatus, GapEvent, MalformedReason, MalformedRow, PacketRow, SummaryRow};

use super::integrity::BucketAnalysis;
use super::partition::BucketKey;
use super::ts_to_rfc3339;

/// Placeholder for empty cells in the summary table.
pub const NO_INFO: &str = "-";

pub(crate) fn build_summary_rows(
    results: Vec<(BucketKey, BucketAnalysis)>,
    empty_groups: &[String],
) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = results
        .into_iter()
        .map(|(key, analysis)| SummaryRow {
            destination: key.destination,
            source: Some(key.source),
            total_packets: analysis.packets,
            status: analysis.status,
            sequence_info: describe_gaps(&analysis.gaps),
            gap_count: analysis.gap_count(),
            duplicate_count: analysis.duplicate_count(),
            missing_packets: analysis.missing_packets(),
            reordered_packets: analysis.reordered_packets,
            first_sequence: analysis.first_sequence,
            last_sequence: analysis.last_sequence,
            gaps: analysis.gaps,
        })
        .collect();

    rows.extend(empty_groups.iter().map(|group| SummaryRow {
        destination: group.clone(),
        source: None,
        total_packets: 0,
        status: BucketStatus::NoPackets,
        sequence_info: NO_INFO.to_string(),
        gap_count: 0,
        duplicate_count: 0,
        missing_packets: 0,
        reordered_packets: 0,
        first_sequence: None,
        last_sequence: None,
        gaps: Vec::new(),
    }));

    rows.sort_by(|a, b| {
        a.destination
            .cmp(&b.destination)
            .then_with(|| a.source.cmp(&b.source))
    });
    rows
}

/// Compact `Expected E, got A, No. F` list covering every event, or `-`.
///
/// # Examples
/// ```
/// use seqshark_core::{describe_gaps, GapEvent, GapKind};
///
/// let gaps = vec![GapEvent {
///     frame_number: 4,
///     expected: 12,
///     actual: 13,
///     missing: 1,
///     kind: GapKind::Gap,
/// }];
/// assert_eq!(describe_gaps(&gaps), "Expected 12, got 13, No. 4");
/// assert_eq!(describe_gaps(&[]), "-");
/// ```
pub fn describe_gaps(gaps: &[GapEvent]) -> String {
    if gaps.is_empty() {
        return NO_INFO.to_string();
    }
    gaps.iter()
        .map(|gap| {
            format!(
                "Expected {}, got {}, No. {}",
                gap.expected, gap.actual, gap.frame_number
            )
        })
        .collect::<Vec<_>>()
        .join("; ")
}

pub(crate) fn build_packet_rows(records: &[PacketRecord]) -> Vec<PacketRow> {
    records
        .iter()
        .map(|record| PacketRow {
            frame_number: record.frame_number,
            time: record
                .time_text
                .clone()
                .or_else(|| ts_to_rfc3339(record.timestamp)),
            timestamp: record.timestamp,
            source: record.source.clone(),
            destination: record.destination.clone(),
            length: record.length,
            data: record.payload_hex.clone(),
            sequence_number: record.sequence_number,
        })
        .collect()
}

pub(crate) fn build_malformed_rows(malformed: &[(PacketRecord, MalformedReason)]) -> Vec<MalformedRow> {
    malformed
        .iter()
        .map(|(record, reason)| MalformedRow {
            frame_number: record.frame_number,
            source: record.source.clone(),
            destination: record.destination.clone(),
            length: record.length,
            data: record.payload_hex.clone(),
            reason: *reason,
        })
        .collect()
}
