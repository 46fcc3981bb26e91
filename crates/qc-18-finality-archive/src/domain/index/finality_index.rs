//! # Finality Index Map
//!
//! Ordered, append-only id → location map. Entries are immutable once recorded.

use super::SegmentLocation;
use crate::domain::errors::{ArchiveError, ArchiveResult};
use crate::domain::segment::SegmentId;
use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Included};
use std::ops::RangeInclusive;

/// Upper bound on how many missing ids an `IncompleteRange` error lists.
pub const MAX_REPORTED_MISSING: usize = 64;

/// In-memory view of the `finality_index` namespace.
#[derive(Debug, Clone, Default)]
pub struct FinalityIndex {
    entries: BTreeMap<SegmentId, SegmentLocation>,
}

impl FinalityIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a location for `segment_id`.
    ///
    /// Idempotent for an identical location; returns `false` when nothing changed.
    ///
    /// ## Errors
    ///
    /// - `IndexConflict`: the id already maps to a different location
    pub fn record(
        &mut self,
        segment_id: SegmentId,
        location: SegmentLocation,
    ) -> ArchiveResult<bool> {
        match self.entries.get(&segment_id) {
            Some(existing) if *existing == location => Ok(false),
            Some(_) => Err(ArchiveError::IndexConflict { segment_id }),
            None => {
                self.entries.insert(segment_id, location);
                Ok(true)
            }
        }
    }

    /// Pure lookup.
    pub fn locate(&self, segment_id: SegmentId) -> Option<&SegmentLocation> {
        self.entries.get(&segment_id)
    }

    /// Check if the id is indexed.
    pub fn contains(&self, segment_id: SegmentId) -> bool {
        self.entries.contains_key(&segment_id)
    }

    /// Highest indexed id.
    pub fn high_water(&self) -> Option<SegmentId> {
        self.entries.keys().next_back().copied()
    }

    /// Lowest indexed id.
    pub fn low_water(&self) -> Option<SegmentId> {
        self.entries.keys().next().copied()
    }

    /// Ids in `range` without an entry (capped at `MAX_REPORTED_MISSING`).
    pub fn missing_in(&self, range: RangeInclusive<SegmentId>) -> Vec<SegmentId> {
        let mut missing = Vec::new();
        let (start, end) = range.into_inner();
        if start > end {
            return missing;
        }
        let mut expected = start;

        for &id in self.entries.range(start..=end).map(|(id, _)| id) {
            while expected < id && missing.len() < MAX_REPORTED_MISSING {
                missing.push(expected);
                expected += 1;
            }
            if missing.len() >= MAX_REPORTED_MISSING {
                return missing;
            }
            expected = id.saturating_add(1);
            if id == end {
                return missing;
            }
        }

        while expected <= end && missing.len() < MAX_REPORTED_MISSING {
            missing.push(expected);
            if expected == end {
                break;
            }
            expected += 1;
        }
        missing
    }

    /// Entries within `range`, ascending.
    pub fn range(
        &self,
        range: RangeInclusive<SegmentId>,
    ) -> impl DoubleEndedIterator<Item = (&SegmentId, &SegmentLocation)> {
        let (start, end) = range.into_inner();
        // An inverted range yields nothing instead of panicking inside BTreeMap.
        let bounds = if start <= end {
            (Included(start), Included(end))
        } else {
            (Included(start), Excluded(start))
        };
        self.entries.range(bounds)
    }

    /// All entries, ascending.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&SegmentId, &SegmentLocation)> {
        self.entries.iter()
    }

    /// Get total number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
