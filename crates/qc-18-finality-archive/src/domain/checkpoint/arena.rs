//! # Checkpoint Arena
//!
//! Append-only manifest storage indexed by checkpoint id. Slot `n - 1` holds
//! manifest `#n`; links are ids, never pointers.

use super::manifest::{CheckpointId, CheckpointManifest, SegmentRange};
use crate::domain::errors::{ArchiveResult, Hash};
use crate::domain::segment::SegmentId;
use crate::ports::outbound::ContentHasher;

#[derive(Debug, Clone, Default)]
pub struct CheckpointArena {
    manifests: Vec<CheckpointManifest>,
}

impl CheckpointArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next sealed manifest will receive.
    pub fn next_id(&self) -> CheckpointId {
        CheckpointId::new(self.manifests.len() as u64 + 1)
    }

    pub fn get(&self, id: CheckpointId) -> Option<&CheckpointManifest> {
        let slot = id.value().checked_sub(1)?;
        self.manifests.get(usize::try_from(slot).ok()?)
    }

    pub fn latest(&self) -> Option<&CheckpointManifest> {
        self.manifests.last()
    }

    /// First segment id not covered by the latest manifest.
    pub fn next_range_start(&self) -> Option<SegmentId> {
        self.latest().and_then(|m| m.range.end.checked_add(1))
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CheckpointManifest> {
        self.manifests.iter()
    }

    /// Build the next manifest in the chain without appending it.
    ///
    /// The caller persists the result, then hands it to [`commit`](Self::commit).
    pub fn prepare<H: ContentHasher + ?Sized>(
        &self,
        hasher: &H,
        range: SegmentRange,
        segments_root: Hash,
        state_root: Hash,
    ) -> CheckpointManifest {
        CheckpointManifest::build(
            hasher,
            self.next_id(),
            range,
            segments_root,
            state_root,
            self.latest(),
        )
    }

    /// Append a manifest, checking its self-hash and its link to the tail.
    ///
    /// Used both for freshly sealed manifests and for manifests loaded at recovery.
    ///
    /// ## Errors
    ///
    /// - `CorruptedManifest`: bad self-hash, or it does not extend the current tail
    pub fn commit<H: ContentHasher + ?Sized>(
        &mut self,
        hasher: &H,
        manifest: CheckpointManifest,
    ) -> ArchiveResult<()> {
        manifest.verify(hasher)?;
        if !manifest.follows(self.latest()) {
            return Err(manifest.corrupted(format!(
                "does not extend chain tail {}",
                self.latest()
                    .map(|m| m.id.to_string())
                    .unwrap_or_else(|| "(empty)".to_string())
            )));
        }
        self.manifests.push(manifest);
        Ok(())
    }
}
