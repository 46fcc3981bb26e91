//! # Recovery
//!
//! Rebuilds the in-memory index, high-water mark and manifest chain from the
//! store. Damaged entries abort the open; nothing is skipped.

use super::*;
use crate::domain::checkpoint::CheckpointManifest;
use crate::domain::errors::{ArchiveError, CorruptionReason};
use crate::domain::index::SegmentLocation;
use crate::domain::types::{decode_id_key, Namespace};

pub(crate) fn recover<KV, H>(
    kv_store: &KV,
    hasher: &H,
    config: &ArchiveConfig,
) -> ArchiveResult<ArchiveState>
where
    KV: KeyValueStore,
    H: ContentHasher,
{
    let mut state = ArchiveState::default();

    for (key, value) in kv_store.iterate(Namespace::FinalityIndex, &[])? {
        let segment_id = decode_id_key(&key).ok_or_else(|| ArchiveError::Serialization {
            message: format!("index key of {} bytes is not a segment id", key.len()),
        })?;
        let location: SegmentLocation = bincode::deserialize(&value)?;
        if location.segment_id != segment_id || location.key != key {
            return Err(
                ArchiveError::corrupted(CorruptionReason::LocationMismatch).for_segment(segment_id)
            );
        }
        state.index.record(segment_id, location)?;
    }

    for (key, value) in kv_store.iterate(Namespace::FinalityCheckpoints, &[])? {
        let manifest: CheckpointManifest = bincode::deserialize(&value)?;
        if key != manifest.id.to_key() {
            return Err(manifest.corrupted("stored under a different key".to_string()));
        }
        state.checkpoints.commit(hasher, manifest)?;
    }

    let uncovered = match state.checkpoints.latest() {
        Some(latest) => latest.range.end.checked_add(1),
        None => Some(0),
    };
    if let (Some(interval), Some(covered)) = (config.checkpoint_interval, uncovered) {
        let boundaries: Vec<SegmentId> = state
            .index
            .iter()
            .map(|(id, _)| *id)
            .filter(|id| *id >= covered && id % interval == 0)
            .collect();
        state.pending_boundaries.extend(boundaries);
    }

    if !state.index.is_empty() || !state.checkpoints.is_empty() {
        tracing::info!(
            "[qc-18] 💾 Recovered {} segments (high-water {:?}), {} checkpoints, {} pending boundaries",
            state.index.len(),
            state.index.high_water(),
            state.checkpoints.len(),
            state.pending_boundaries.len()
        );
    } else {
        tracing::info!("[qc-18] 📁 No existing finality archive found");
    }

    Ok(state)
}
