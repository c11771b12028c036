use crate::record::PacketRecord;
use crate::{BucketStatus, GapEvent, GapKind};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BucketAnalysis {
    pub packets: u64,
    pub gaps: Vec<GapEvent>,
    pub status: BucketStatus,
    pub reordered_packets: u64,
    pub first_sequence: Option<u32>,
    pub last_sequence: Option<u32>,
}

impl BucketAnalysis {
    pub fn gap_count(&self) -> u64 {
        self.count_kind(GapKind::Gap)
    }

    pub fn duplicate_count(&self) -> u64 {
        self.count_kind(GapKind::Duplicate)
    }

    pub fn missing_packets(&self) -> u64 {
        self.gaps
            .iter()
            .filter(|gap| gap.missing > 0)
            .map(|gap| gap.missing as u64)
            .sum()
    }

    fn count_kind(&self, kind: GapKind) -> u64 {
        self.gaps.iter().filter(|gap| gap.kind == kind).count() as u64
    }
}

/// Walk a bucket in sequence-number order and record every discontinuity.
///
/// `records` is in capture order and every record carries a sequence number.
/// The sort is stable, so duplicates keep their capture order and the event
/// names the later copy. Wraparound at 2^32 is not special-cased.
pub(crate) fn analyze_bucket(records: &[&PacketRecord]) -> BucketAnalysis {
    let mut ordered: Vec<(u32, u64)> = records
        .iter()
        .filter_map(|record| record.sequence_number.map(|seq| (seq, record.frame_number)))
        .collect();
    let reordered_packets = count_reordered(ordered.iter().map(|(seq, _)| *seq));
    ordered.sort_by_key(|(seq, _)| *seq);

    let gaps: Vec<GapEvent> = ordered
        .windows(2)
        .filter_map(|pair| {
            let (previous, _) = pair[0];
            let (actual, frame_number) = pair[1];
            let expected = u64::from(previous) + 1;
            if u64::from(actual) == expected {
                return None;
            }
            let missing = i64::from(actual) - expected as i64;
            Some(GapEvent {
                frame_number,
                expected,
                actual,
                missing,
                kind: GapKind::from_missing(missing),
            })
        })
        .collect();

    let status = if ordered.is_empty() {
        BucketStatus::NoPackets
    } else if gaps.is_empty() {
        BucketStatus::InOrder
    } else {
        BucketStatus::AnomaliesDetected
    };

    BucketAnalysis {
        packets: ordered.len() as u64,
        status,
        reordered_packets,
        first_sequence: ordered.first().map(|(seq, _)| *seq),
        last_sequence: ordered.last().map(|(seq, _)| *seq),
        gaps,
    }
}

/// Records that arrived after a higher sequence number had already been seen.
fn count_reordered(sequences: impl Iterator<Item = u32>) -> u64 {
    let mut highest: Option<u32> = None;
    let mut reordered = 0u64;
    for seq in sequences {
        match highest {
            Some(max) if seq < max => reordered += 1,
            _ => highest = Some(seq),
        }
    }
    reordered
}

#[cfg(test)]
mod tests {
    use super::analyze_bucket;
    use crate::record::PacketRecord;
    use crate::{BucketStatus, GapKind};

    fn bucket(sequences: &[u32]) -> Vec<PacketRecord> {
        sequences
            .iter()
            .enumerate()
            .map(|(idx, seq)| {
                let mut record =
                    PacketRecord::new(idx as u64 + 1, None, "10.1.1.1", "239.50.1.1", 100, None);
                record.sequence_number = Some(*seq);
                record
            })
            .collect()
    }

    fn run(sequences: &[u32]) -> super::BucketAnalysis {
        let records = bucket(sequences);
        let refs: Vec<&PacketRecord> = records.iter().collect();
        analyze_bucket(&refs)
    }

    #[test]
    fn contiguous_in_any_arrival_order_is_in_order() {
        for sequences in [[1, 2, 3, 4, 5], [5, 4, 3, 2, 1], [3, 1, 2, 5, 4]] {
            let result = run(&sequences);
            assert!(result.gaps.is_empty());
            assert_eq!(result.status, BucketStatus::InOrder);
            assert_eq!(result.packets, 5);
        }
    }

    #[test]
    fn forward_gap_reports_missing_count() {
        let result = run(&[1, 2, 4, 5]);
        assert_eq!(result.status, BucketStatus::AnomaliesDetected);
        assert_eq!(result.gaps.len(), 1);
        let gap = &result.gaps[0];
        assert_eq!(gap.expected, 3);
        assert_eq!(gap.actual, 4);
        assert_eq!(gap.missing, 1);
        assert_eq!(gap.kind, GapKind::Gap);
        assert_eq!(gap.frame_number, 3);
        assert_eq!(result.missing_packets(), 1);
    }

    #[test]
    fn duplicate_is_distinct_from_gap() {
        let result = run(&[1, 2, 2, 3]);
        assert_eq!(result.gaps.len(), 1);
        let dup = &result.gaps[0];
        assert_eq!(dup.expected, 3);
        assert_eq!(dup.actual, 2);
        assert_eq!(dup.missing, -1);
        assert_eq!(dup.kind, GapKind::Duplicate);
        assert_eq!(dup.frame_number, 3);
        assert_eq!(result.duplicate_count(), 1);
        assert_eq!(result.gap_count(), 0);
        assert_eq!(result.missing_packets(), 0);
    }

    #[test]
    fn reordering_is_absorbed_by_sort() {
        let result = run(&[10, 11, 13, 12, 14]);
        assert_eq!(result.gaps.len(), 0);
        assert_eq!(result.reordered_packets, 1);
        assert_eq!(result.first_sequence, Some(10));
        assert_eq!(result.last_sequence, Some(14));
    }

    #[test]
    fn event_count_matches_adjacent_mismatches() {
        let sequences = [1, 1, 1, 4, 9, 10, 12];
        let result = run(&sequences);
        let mut sorted = sequences.to_vec();
        sorted.sort_unstable();
        let mismatches = sorted
            .windows(2)
            .filter(|pair| u64::from(pair[1]) != u64::from(pair[0]) + 1)
            .count();
        assert_eq!(result.gaps.len(), mismatches);
        assert_eq!(result.duplicate_count(), 2);
        assert_eq!(result.gap_count(), 3);
        assert_eq!(result.missing_packets(), 2 + 4 + 1);
    }

    #[test]
    fn empty_bucket_has_no_packets() {
        let result = run(&[]);
        assert_eq!(result.status, BucketStatus::NoPackets);
        assert_eq!(result.packets, 0);
        assert_eq!(result.first_sequence, None);
    }

    #[test]
    fn single_packet_is_in_order() {
        assert_eq!(run(&[42]).status, BucketStatus::InOrder);
    }

    #[test]
    fn wraparound_is_reported_as_gap() {
        let result = run(&[u32::MAX - 1, u32::MAX, 0, 1]);
        assert_eq!(result.gaps.len(), 1);
        let gap = &result.gaps[0];
        assert_eq!(gap.expected, 2);
        assert_eq!(gap.actual, u32::MAX - 1);
        assert_eq!(gap.missing, i64::from(u32::MAX) - 3);
    }

    #[test]
    fn max_sequence_does_not_overflow_expected() {
        let result = run(&[u32::MAX, u32::MAX]);
        assert_eq!(result.gaps[0].expected, u64::from(u32::MAX) + 1);
        assert_eq!(result.gaps[0].missing, -1);
    }
}
