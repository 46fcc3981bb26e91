//! # Read Path
//!
//! Fails closed: bytes are checked against their index entry, then decoded
//! and checksummed, before any payload leaves the service.

use super::*;
use crate::domain::errors::{ArchiveError, CorruptionReason};
use crate::domain::index::SegmentLocation;
use crate::domain::types::Namespace;

impl<KV, H> FinalityArchiveService<KV, H>
where
    KV: KeyValueStore,
    H: ContentHasher,
{
    pub(crate) fn retrieve(&self, segment_id: SegmentId) -> ArchiveResult<Vec<u8>> {
        let location = self
            .state
            .read()
            .index
            .locate(segment_id)
            .cloned()
            .ok_or(ArchiveError::NotFound { segment_id })?;

        self.read_verified(&location).inspect_err(|err| {
            if err.is_integrity_failure() {
                tracing::error!("[qc-18] ❌ {}", err);
            }
        })
    }

    /// Load and verify the envelope an index entry points at.
    pub(crate) fn read_verified(&self, location: &SegmentLocation) -> ArchiveResult<Vec<u8>> {
        let segment_id = location.segment_id;
        let corrupted =
            |reason: CorruptionReason| ArchiveError::corrupted(reason).for_segment(segment_id);

        let envelope = self
            .kv_store
            .get(Namespace::FinalityArchive, &location.key)?
            .ok_or_else(|| corrupted(CorruptionReason::MissingEnvelope))?;

        if envelope.len() as u64 != location.envelope_len
            || self.codec.hasher().hash(&envelope) != location.envelope_digest
        {
            return Err(corrupted(CorruptionReason::LocationMismatch));
        }

        let payload = self
            .codec
            .decode_with(&envelope, location.transform)
            .map_err(|err| err.for_segment(segment_id))?;

        // Digest matched, so the header checksum is the one recorded at write time.
        Ok(payload)
    }
}
