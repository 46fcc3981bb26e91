//! # Checkpoint Sealing and Replay
//!
//! Sealing is a barrier over the index: a manifest is produced only once
//! every id in its range has a durable index entry. Seals are serialized by
//! `seal_lock`; archive calls keep running while a seal is in progress.

use super::*;
use crate::domain::checkpoint::{
    compute_segments_root, CheckpointId, CheckpointManifest, SegmentRange,
};
use crate::domain::errors::{ArchiveError, Hash};
use crate::domain::types::Namespace;
use rayon::prelude::*;

impl<KV, H> FinalityArchiveService<KV, H>
where
    KV: KeyValueStore,
    H: ContentHasher,
{
    pub(crate) fn seal(
        &self,
        range: SegmentRange,
        state_root: Hash,
    ) -> ArchiveResult<CheckpointManifest> {
        let _guard = self.seal_lock.lock();
        self.seal_locked(range, Some(state_root))
    }

    /// Build, persist, then publish a manifest. Caller holds `seal_lock`.
    ///
    /// `state_root = None` commits to the segments root itself.
    fn seal_locked(
        &self,
        range: SegmentRange,
        state_root: Option<Hash>,
    ) -> ArchiveResult<CheckpointManifest> {
        let hasher = self.codec.hasher();

        let manifest = {
            let state = self.state.read();
            let missing = state.index.missing_in(range.ids());
            if !missing.is_empty() {
                tracing::warn!(
                    "[qc-18] ⚠️ Cannot seal {}: {} id(s) not archived, first {}",
                    range,
                    missing.len(),
                    missing[0]
                );
                return Err(ArchiveError::IncompleteRange {
                    start: range.start,
                    end: range.end,
                    missing,
                });
            }

            let segments_root = compute_segments_root(
                hasher,
                state
                    .index
                    .range(range.ids())
                    .map(|(id, location)| (*id, &location.checksum)),
            );
            state.checkpoints.prepare(
                hasher,
                range,
                segments_root,
                state_root.unwrap_or(segments_root),
            )
        };

        let bytes = bincode::serialize(&manifest)?;
        self.kv_store
            .put(Namespace::FinalityCheckpoints, &manifest.id.to_key(), &bytes)?;

        self.state
            .write()
            .checkpoints
            .commit(hasher, manifest.clone())?;

        tracing::info!(
            "[qc-18] 🔒 Checkpoint {} sealed over {} ({} segments, root 0x{})",
            manifest.id,
            manifest.range,
            manifest.segment_count,
            hex::encode(&manifest.segments_root[..8])
        );
        Ok(manifest)
    }

    /// Seal every pending boundary whose range is now fully indexed.
    ///
    /// Ids below the high-water mark that are neither indexed nor in flight can
    /// never be archived under either append policy; an automatic range starts
    /// after the highest such gap instead of waiting on it forever.
    pub(crate) fn seal_ready_boundaries(&self) {
        if self.config.checkpoint_interval.is_none()
            || self.state.read().pending_boundaries.is_empty()
        {
            return;
        }
        let _guard = self.seal_lock.lock();

        loop {
            let next = {
                let mut state = self.state.write();
                let Some(boundary) = state.pending_boundaries.first().copied() else {
                    return;
                };
                let start = state
                    .checkpoints
                    .next_range_start()
                    .or_else(|| state.index.low_water())
                    .unwrap_or(boundary);
                if start > boundary {
                    // Already covered by an earlier manifest.
                    state.pending_boundaries.remove(&boundary);
                    continue;
                }

                if !state.index.contains(boundary) {
                    state.pending_boundaries.remove(&boundary);
                    continue;
                }

                // Walk down from the boundary while ids stay contiguous.
                let mut run_start = boundary;
                for (&id, _) in state.index.range(start..=boundary).rev().skip(1) {
                    if id + 1 == run_start {
                        run_start = id;
                    } else {
                        break;
                    }
                }

                if run_start > start {
                    let gap = run_start - 1;
                    if state.in_flight.contains_key(&gap) {
                        // Barrier: wait for the writer to finish.
                        return;
                    }
                    tracing::warn!(
                        "[qc-18] ⚠️ Segment {} will never be archived; auto checkpoint starts at {}",
                        gap,
                        run_start
                    );
                }
                (boundary, run_start)
            };

            let (boundary, run_start) = next;
            let sealed = SegmentRange::new(run_start, boundary)
                .and_then(|range| self.seal_locked(range, None));
            match sealed {
                Ok(_) => {
                    self.state.write().pending_boundaries.remove(&boundary);
                }
                Err(err) => {
                    tracing::warn!(
                        "[qc-18] ⚠️ Automatic checkpoint at {} deferred: {}",
                        boundary,
                        err
                    );
                    return;
                }
            }
        }
    }

    /// Re-retrieve a manifest's range in parallel and check it against the manifest.
    pub(crate) fn replay(&self, id: CheckpointId) -> ArchiveResult<Vec<(SegmentId, Vec<u8>)>> {
        let manifest = self
            .state
            .read()
            .checkpoints
            .get(id)
            .cloned()
            .ok_or(ArchiveError::CheckpointNotFound { id })?;
        let hasher = self.codec.hasher();
        manifest.verify(hasher)?;

        let mut segments: Vec<(SegmentId, Vec<u8>)> = manifest
            .range
            .ids()
            .into_par_iter()
            .map(|segment_id| self.retrieve(segment_id).map(|payload| (segment_id, payload)))
            .collect::<ArchiveResult<_>>()?;
        segments.sort_unstable_by_key(|(segment_id, _)| *segment_id);

        let checksums: Vec<(SegmentId, Hash)> = segments
            .par_iter()
            .map(|(segment_id, payload)| (*segment_id, hasher.hash(payload)))
            .collect();
        let root = compute_segments_root(hasher, checksums.iter().map(|(id, c)| (*id, c)));

        if root != manifest.segments_root {
            tracing::error!("[qc-18] ❌ Replay of checkpoint {} produced a different root", id);
            return Err(manifest.corrupted(format!(
                "replayed root 0x{} differs from sealed 0x{}",
                hex::encode(&root[..8]),
                hex::encode(&manifest.segments_root[..8])
            )));
        }

        tracing::info!(
            "[qc-18] ↺ Checkpoint {} replayed ({} segments)",
            id,
            segments.len()
        );
        Ok(segments)
    }
}
