//! # Write Path
//!
//! `Pending → Compressing → Writing → Durable`, or `→ Failed` from any live
//! state. The index entry is recorded only after the store acknowledges the
//! envelope, so a failed call never leaves an entry behind.

use super::*;
use crate::domain::compression::security::validate_payload_size;
use crate::domain::compression::Transform;
use crate::domain::errors::{ArchiveError, Hash};
use crate::domain::index::SegmentLocation;
use crate::domain::types::{segment_key, AppendPolicy, Namespace, WriteMode};
use crate::ports::outbound::BatchOperation;

/// Outcome of reserving a segment id.
pub(crate) enum Reservation {
    /// Id reserved for this caller.
    Reserved,
    /// Id already durable; caller decides between idempotent success and conflict.
    Indexed(SegmentLocation),
}

impl<KV, H> FinalityArchiveService<KV, H>
where
    KV: KeyValueStore,
    H: ContentHasher,
{
    /// Archive with the configured default compression parameters.
    pub fn archive_with_defaults(
        &self,
        segment_id: SegmentId,
        payload: &[u8],
    ) -> ArchiveResult<SegmentLocation> {
        let transform = self.config.compression.transform()?;
        self.archive(segment_id, payload, transform)
    }

    pub(crate) fn archive(
        &self,
        segment_id: SegmentId,
        payload: &[u8],
        transform: Transform,
    ) -> ArchiveResult<SegmentLocation> {
        // Bounds first: nothing is reserved for a payload that can never be written.
        if payload.is_empty() {
            return Err(ArchiveError::EmptyPayload);
        }
        validate_payload_size(payload.len(), self.codec.manager().max_payload_size())?;

        match self.reserve(segment_id)? {
            Reservation::Indexed(existing) => {
                return self.resolve_duplicate(segment_id, payload, existing)
            }
            Reservation::Reserved => {}
        }

        let written = self.write_segment(segment_id, payload, transform);
        self.complete(segment_id, written)
    }

    /// Settle a reserved id. Either outcome frees it, so boundaries waiting on
    /// it are re-examined.
    pub(super) fn complete(
        &self,
        segment_id: SegmentId,
        written: ArchiveResult<SegmentLocation>,
    ) -> ArchiveResult<SegmentLocation> {
        match &written {
            Ok(location) => self.mark_durable(segment_id, location),
            Err(err) => self.mark_failed(segment_id, err),
        }
        self.seal_ready_boundaries();
        written
    }

    /// Reserve `segment_id` under the append policy.
    ///
    /// In-flight ids count toward the high-water mark.
    pub(crate) fn reserve(&self, segment_id: SegmentId) -> ArchiveResult<Reservation> {
        let mut state = self.state.write();

        if let Some(existing) = state.index.locate(segment_id) {
            return Ok(Reservation::Indexed(existing.clone()));
        }
        if state.in_flight.contains_key(&segment_id) {
            return Err(ArchiveError::SegmentInFlight { segment_id });
        }

        if let Some(high_water) = state.high_water() {
            let accepted = match self.config.append_policy {
                AppendPolicy::Monotonic => segment_id > high_water,
                AppendPolicy::Contiguous => high_water.checked_add(1) == Some(segment_id),
            };
            if !accepted {
                tracing::warn!(
                    "[qc-18] ⚠️ Segment {} rejected: high-water mark is {} ({:?})",
                    segment_id,
                    high_water,
                    self.config.append_policy
                );
                return Err(ArchiveError::NonMonotonicSegment {
                    segment_id,
                    high_water,
                });
            }
        }

        state.in_flight.insert(segment_id, SegmentState::Pending);
        state.failed.remove(&segment_id);
        Ok(Reservation::Reserved)
    }

    /// Same content is an idempotent success; anything else is a conflict.
    fn resolve_duplicate(
        &self,
        segment_id: SegmentId,
        payload: &[u8],
        existing: SegmentLocation,
    ) -> ArchiveResult<SegmentLocation> {
        let checksum: Hash = self.codec.hasher().hash(payload);
        if existing.holds_content(&checksum) {
            tracing::debug!("[qc-18] Segment {} already archived, identical content", segment_id);
            Ok(existing)
        } else {
            tracing::warn!(
                "[qc-18] ⚠️ Index conflict on segment {}: stored 0x{}, offered 0x{}",
                segment_id,
                hex::encode(&existing.checksum[..4]),
                hex::encode(&checksum[..4])
            );
            Err(ArchiveError::IndexConflict { segment_id })
        }
    }

    /// Encode and persist. Runs without the state lock.
    pub(super) fn write_segment(
        &self,
        segment_id: SegmentId,
        payload: &[u8],
        transform: Transform,
    ) -> ArchiveResult<SegmentLocation> {
        self.transition(segment_id, SegmentState::Compressing);
        let (envelope, header) = self.codec.encode_with(payload, transform)?;

        let key = segment_key(segment_id).to_vec();
        let location = SegmentLocation {
            segment_id,
            key: key.clone(),
            envelope_len: envelope.len() as u64,
            checksum: header.checksum,
            envelope_digest: self.codec.hasher().hash(&envelope),
            transform,
        };
        let entry = bincode::serialize(&location)?;

        self.transition(segment_id, SegmentState::Writing);
        match self.config.write_mode {
            WriteMode::AtomicBatch => {
                self.kv_store.atomic_batch_write(vec![
                    BatchOperation::put(Namespace::FinalityArchive, key.clone(), envelope),
                    BatchOperation::put(Namespace::FinalityIndex, key, entry),
                ])?;
            }
            WriteMode::DurableThenIndex => {
                self.kv_store
                    .put(Namespace::FinalityArchive, &key, &envelope)?;
                self.kv_store.put(Namespace::FinalityIndex, &key, &entry)?;
            }
        }

        Ok(location)
    }

    fn transition(&self, segment_id: SegmentId, next: SegmentState) {
        self.state.write().advance(segment_id, next);
    }

    fn mark_durable(&self, segment_id: SegmentId, location: &SegmentLocation) {
        let mut state = self.state.write();
        state.advance(segment_id, SegmentState::Durable);
        state.in_flight.remove(&segment_id);

        // The id was reserved by this call, so the slot is free.
        if let Err(err) = state.index.record(segment_id, location.clone()) {
            tracing::error!("[qc-18] ❌ Index update for segment {} failed: {}", segment_id, err);
            return;
        }

        if let Some(interval) = self.config.checkpoint_interval {
            if segment_id % interval == 0 {
                state.pending_boundaries.insert(segment_id);
            }
        }

        tracing::info!(
            "[qc-18] ✓ Segment {} archived ({} bytes, {})",
            segment_id,
            location.envelope_len,
            if location.transform.is_compressed() {
                "zstd"
            } else {
                "raw"
            }
        );
    }

    fn mark_failed(&self, segment_id: SegmentId, err: &ArchiveError) {
        let mut state = self.state.write();
        state.advance(segment_id, SegmentState::Failed);
        state.in_flight.remove(&segment_id);
        state.remember_failure(segment_id);

        tracing::warn!(
            "[qc-18] ⚠️ Segment {} failed, id released: {}",
            segment_id,
            err
        );
    }

    /// Write-path state as seen by this instance.
    pub(crate) fn state_of(&self, segment_id: SegmentId) -> Option<SegmentState> {
        let state = self.state.read();
        if state.index.contains(segment_id) {
            Some(SegmentState::Durable)
        } else if let Some(live) = state.in_flight.get(&segment_id) {
            Some(*live)
        } else if state.failed.contains(&segment_id) {
            Some(SegmentState::Failed)
        } else {
            None
        }
    }
}
