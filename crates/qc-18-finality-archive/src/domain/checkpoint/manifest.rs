//! # Manifest Entity

use crate::domain::errors::{ArchiveError, ArchiveResult, Hash};
use crate::domain::segment::SegmentId;
use crate::ports::outbound::ContentHasher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

// =============================================================================
// CHECKPOINT ID
// =============================================================================

/// Sequential checkpoint identifier. The first manifest is `#1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CheckpointId(u64);

impl CheckpointId {
    pub const FIRST: CheckpointId = CheckpointId(1);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Key inside the `finality_checkpoints` namespace.
    pub fn to_key(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// SEGMENT RANGE
// =============================================================================

/// Inclusive, non-empty range of segment ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRange {
    pub start: SegmentId,
    pub end: SegmentId,
}

impl SegmentRange {
    /// ## Errors
    ///
    /// - `InvalidRange`: `start > end`
    pub fn new(start: SegmentId, end: SegmentId) -> ArchiveResult<Self> {
        if start > end {
            return Err(ArchiveError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Number of ids covered (saturates for the full u64 domain).
    pub fn segment_count(&self) -> u64 {
        self.end.saturating_sub(self.start).saturating_add(1)
    }

    pub fn contains(&self, id: SegmentId) -> bool {
        self.start <= id && id <= self.end
    }

    pub fn ids(&self) -> RangeInclusive<SegmentId> {
        self.start..=self.end
    }
}

impl TryFrom<RangeInclusive<SegmentId>> for SegmentRange {
    type Error = ArchiveError;

    fn try_from(range: RangeInclusive<SegmentId>) -> ArchiveResult<Self> {
        let (start, end) = range.into_inner();
        Self::new(start, end)
    }
}

impl fmt::Display for SegmentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

// =============================================================================
// SEGMENTS ROOT
// =============================================================================

/// Commitment over `(id_be || checksum)` for every segment, ids ascending.
///
/// Order is fixed by id, so the root is independent of arrival order.
pub fn compute_segments_root<'a, H, I>(hasher: &H, entries: I) -> Hash
where
    H: ContentHasher + ?Sized,
    I: IntoIterator<Item = (SegmentId, &'a Hash)>,
{
    let mut buf = Vec::new();
    for (id, checksum) in entries {
        buf.extend_from_slice(&id.to_be_bytes());
        buf.extend_from_slice(checksum);
    }
    hasher.hash(&buf)
}

// =============================================================================
// CHECKPOINT MANIFEST
// =============================================================================

/// Sealed summary of an archived segment range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointManifest {
    pub id: CheckpointId,
    pub range: SegmentRange,
    pub segment_count: u64,
    /// Root over the segment checksums in `range`.
    pub segments_root: Hash,
    /// Caller-supplied state commitment at `range.end`.
    pub state_root: Hash,
    pub previous: Option<CheckpointId>,
    /// `manifest_hash` of `previous`, zero for the first manifest.
    pub previous_hash: Hash,
    pub manifest_hash: Hash,
}

impl CheckpointManifest {
    /// Build a manifest linked to `previous` and stamp its hash.
    pub fn build<H: ContentHasher + ?Sized>(
        hasher: &H,
        id: CheckpointId,
        range: SegmentRange,
        segments_root: Hash,
        state_root: Hash,
        previous: Option<&CheckpointManifest>,
    ) -> Self {
        let mut manifest = Self {
            id,
            range,
            segment_count: range.segment_count(),
            segments_root,
            state_root,
            previous: previous.map(|p| p.id),
            previous_hash: previous.map(|p| p.manifest_hash).unwrap_or([0u8; 32]),
            manifest_hash: [0u8; 32],
        };
        manifest.manifest_hash = manifest.compute_hash(hasher);
        manifest
    }

    /// Hash over every field except `manifest_hash` itself.
    pub fn compute_hash<H: ContentHasher + ?Sized>(&self, hasher: &H) -> Hash {
        let mut buf = Vec::with_capacity(8 * 5 + 32 * 3);
        buf.extend_from_slice(&self.id.value().to_be_bytes());
        buf.extend_from_slice(&self.range.start.to_be_bytes());
        buf.extend_from_slice(&self.range.end.to_be_bytes());
        buf.extend_from_slice(&self.segment_count.to_be_bytes());
        buf.extend_from_slice(&self.previous.map(|p| p.value()).unwrap_or(0).to_be_bytes());
        buf.extend_from_slice(&self.segments_root);
        buf.extend_from_slice(&self.state_root);
        buf.extend_from_slice(&self.previous_hash);
        hasher.hash(&buf)
    }

    /// Check the range, the segment count and the self-hash.
    ///
    /// ## Errors
    ///
    /// - `CorruptedManifest`: inverted range, or any field disagrees with `manifest_hash`
    pub fn verify<H: ContentHasher + ?Sized>(&self, hasher: &H) -> ArchiveResult<()> {
        if self.range.start > self.range.end {
            return Err(self.corrupted(format!("inverted range {}", self.range)));
        }
        if self.segment_count != self.range.segment_count() {
            return Err(self.corrupted(format!(
                "segment count {} does not cover range {}",
                self.segment_count, self.range
            )));
        }
        if self.compute_hash(hasher) != self.manifest_hash {
            return Err(self.corrupted("manifest hash mismatch".to_string()));
        }
        Ok(())
    }

    /// Whether this manifest links directly onto `previous` (or starts the chain).
    pub fn follows(&self, previous: Option<&CheckpointManifest>) -> bool {
        match previous {
            None => self.id == CheckpointId::FIRST && self.previous.is_none(),
            Some(prev) => {
                self.id == prev.id.next()
                    && self.previous == Some(prev.id)
                    && self.previous_hash == prev.manifest_hash
            }
        }
    }

    pub(crate) fn corrupted(&self, reason: String) -> ArchiveError {
        ArchiveError::CorruptedManifest {
            id: self.id,
            reason,
        }
    }
}
