use crate::config::Engine;
use crate::record::PacketRecord;
use crate::MalformedReason;

#[derive(Debug, Default)]
pub struct FilterOutcome {
    pub accepted: Vec<PacketRecord>,
    pub malformed: Vec<(PacketRecord, MalformedReason)>,
}

/// Why a record is excluded from analysis, if it is.
///
/// The destination check wins over the payload check; an absent payload is
/// never evidence of malformation by itself.
pub fn malformed_reason(engine: &Engine, record: &PacketRecord) -> Option<MalformedReason> {
    if !engine.is_group_of_interest(&record.destination) {
        return Some(MalformedReason::ForeignDestination);
    }
    if engine.is_short_marked_frame(record.payload(), record.length) {
        return Some(MalformedReason::ShortMarkedFrame);
    }
    None
}

/// Split records into those of interest and the malformed audit set.
///
/// Capture order is preserved on both sides.
pub fn filter_malformed(engine: &Engine, records: Vec<PacketRecord>) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();
    for record in records {
        match malformed_reason(engine, &record) {
            Some(reason) => {
                log::debug!(
                    "frame {} excluded ({}): {} -> {}",
                    record.frame_number,
                    reason,
                    record.source,
                    record.destination
                );
                outcome.malformed.push((record, reason));
            }
            None => outcome.accepted.push(record),
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::{filter_malformed, malformed_reason};
    use crate::config::{Engine, EngineConfig};
    use crate::record::PacketRecord;
    use crate::MalformedReason;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).unwrap()
    }

    fn record(frame: u64, dst: &str, length: u64, payload: Option<&str>) -> PacketRecord {
        PacketRecord::new(frame, Some(frame as f64), "10.1.1.1", dst, length, payload)
    }

    #[test]
    fn foreign_destination_always_excluded() {
        let engine = engine();
        for payload in [None, Some("3100"), Some("00000000000000000000000000010000")] {
            let rec = record(1, "10.0.0.1", 200, payload);
            assert_eq!(
                malformed_reason(&engine, &rec),
                Some(MalformedReason::ForeignDestination)
            );
        }
    }

    #[test]
    fn short_marked_frame_excluded_long_one_kept() {
        let engine = engine();
        let short = record(1, "239.50.1.1", 60, Some("3100aabbccdd"));
        let long = record(2, "239.50.1.1", 200, Some("3100aabbccdd"));
        let boundary = record(3, "239.50.1.1", 65, Some("3100aabbccdd"));
        assert_eq!(
            malformed_reason(&engine, &short),
            Some(MalformedReason::ShortMarkedFrame)
        );
        assert_eq!(malformed_reason(&engine, &long), None);
        assert_eq!(
            malformed_reason(&engine, &boundary),
            Some(MalformedReason::ShortMarkedFrame)
        );
    }

    #[test]
    fn absent_payload_skips_marker_check() {
        let engine = engine();
        let rec = record(1, "239.50.1.1", 10, None);
        assert_eq!(malformed_reason(&engine, &rec), None);
    }

    #[test]
    fn filter_is_idempotent() {
        let engine = engine();
        let records = vec![
            record(1, "239.50.1.1", 100, Some("00")),
            record(2, "239.51.1.1", 100, Some("00")),
            record(3, "239.50.1.2", 40, Some("3100")),
            record(4, "239.50.1.2", 40, None),
        ];
        let once = filter_malformed(&engine, records);
        assert_eq!(once.accepted.len(), 2);
        assert_eq!(once.malformed.len(), 2);

        let twice = filter_malformed(&engine, once.accepted.clone());
        assert_eq!(twice.accepted, once.accepted);
        assert!(twice.malformed.is_empty());
    }
}
