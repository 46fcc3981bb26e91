//! # Key Layout
//!
//! Every record lives in one of three namespaces. Ids are encoded big-endian
//! so lexicographic key order equals numeric order.

use crate::domain::segment::SegmentId;
use std::fmt;

/// Key-value namespaces consumed by the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    /// Envelope bytes keyed by segment id.
    FinalityArchive,
    /// Segment id → SegmentLocation.
    FinalityIndex,
    /// Checkpoint id → CheckpointManifest.
    FinalityCheckpoints,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [
        Namespace::FinalityArchive,
        Namespace::FinalityIndex,
        Namespace::FinalityCheckpoints,
    ];

    /// Column family / namespace name.
    pub fn name(&self) -> &'static str {
        match self {
            Namespace::FinalityArchive => "finality_archive",
            Namespace::FinalityIndex => "finality_index",
            Namespace::FinalityCheckpoints => "finality_checkpoints",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ns| ns.name() == name)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key of a segment in `finality_archive` and `finality_index`.
pub fn segment_key(segment_id: SegmentId) -> [u8; 8] {
    segment_id.to_be_bytes()
}

/// Decode an 8-byte big-endian id key. `None` for any other length.
pub fn decode_id_key(key: &[u8]) -> Option<u64> {
    let bytes: [u8; 8] = key.try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}
