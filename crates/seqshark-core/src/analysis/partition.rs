use std::collections::{BTreeMap, BTreeSet};

use crate::record::PacketRecord;

/// Destination groups the caller wants analysed.
///
/// # Examples
/// ```
/// use seqshark_core::GroupSelection;
///
/// let selection = GroupSelection::only(["239.50.1.1"]);
/// assert!(selection.contains("239.50.1.1"));
/// assert!(!selection.contains("239.50.1.2"));
/// assert!(GroupSelection::All.contains("239.50.1.2"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GroupSelection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl GroupSelection {
    pub fn only<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(groups.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, group: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(groups) => groups.contains(group),
        }
    }
}

/// Bucket identity; ordering is destination then source, lexicographic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    pub destination: String,
    pub source: String,
}

#[derive(Debug, Default)]
pub struct Partition<'a> {
    /// Sequenced records per bucket, in capture order. A bucket whose records
    /// all lack a sequence number is present and empty.
    pub buckets: BTreeMap<BucketKey, Vec<&'a PacketRecord>>,
    /// Selected records without a sequence number.
    pub unsequenced: Vec<&'a PacketRecord>,
    /// Records whose destination was not selected.
    pub outside_selection: usize,
    /// Selected groups with no record at all.
    pub empty_groups: Vec<String>,
}

/// Bucket filtered records by `(destination, source)` within the selection.
pub fn partition_records<'a>(
    records: &'a [PacketRecord],
    selection: &GroupSelection,
) -> Partition<'a> {
    let mut partition = Partition::default();
    let mut seen_groups = BTreeSet::new();

    for record in records {
        if !selection.contains(&record.destination) {
            partition.outside_selection += 1;
            continue;
        }
        seen_groups.insert(record.destination.as_str());
        let bucket = partition
            .buckets
            .entry(BucketKey {
                destination: record.destination.clone(),
                source: record.source.clone(),
            })
            .or_default();
        if record.sequence_number.is_some() {
            bucket.push(record);
        } else {
            partition.unsequenced.push(record);
        }
    }

    if let GroupSelection::Only(groups) = selection {
        partition.empty_groups = groups
            .iter()
            .filter(|group| !seen_groups.contains(group.as_str()))
            .cloned()
            .collect();
    }
    partition
}

/// Sorted, de-duplicated destinations present in `records`.
pub fn available_groups(records: &[PacketRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.destination.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
