//! # Segment Location
//!
//! Back-reference from the index to an envelope in the `finality_archive`
//! namespace. Created only after the envelope write is acknowledged.

use crate::domain::compression::Transform;
use crate::domain::errors::Hash;
use crate::domain::segment::SegmentId;
use serde::{Deserialize, Serialize};

/// Physical location of an archived segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentLocation {
    /// Logical segment id.
    pub segment_id: SegmentId,
    /// Key of the envelope inside the `finality_archive` namespace.
    pub key: Vec<u8>,
    /// Exact length of the stored envelope.
    pub envelope_len: u64,
    /// Content hash of the uncompressed payload (mirrors the envelope header).
    pub checksum: Hash,
    /// Content hash of the full envelope bytes as written.
    pub envelope_digest: Hash,
    /// Transform used for the envelope body.
    pub transform: Transform,
}

impl SegmentLocation {
    /// Whether this location holds the same payload as `checksum`.
    pub fn holds_content(&self, checksum: &Hash) -> bool {
        &self.checksum == checksum
    }
}
