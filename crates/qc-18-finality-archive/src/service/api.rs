//! # Finality Archive API Implementation

use super::*;
use crate::domain::audit::AuditReport;
use crate::domain::checkpoint::{CheckpointId, CheckpointManifest, SegmentRange};
use crate::domain::compression::CompressionParams;
use crate::domain::errors::Hash;
use crate::domain::index::SegmentLocation;
use crate::ports::inbound::FinalityArchiveApi;

impl<KV, H> FinalityArchiveApi for FinalityArchiveService<KV, H>
where
    KV: KeyValueStore,
    H: ContentHasher,
{
    fn archive_segment(
        &self,
        segment_id: SegmentId,
        payload: &[u8],
        params: &CompressionParams,
    ) -> ArchiveResult<SegmentLocation> {
        let transform = params.transform()?;
        self.archive(segment_id, payload, transform)
    }

    fn retrieve_segment(&self, segment_id: SegmentId) -> ArchiveResult<Vec<u8>> {
        self.retrieve(segment_id)
    }

    fn locate(&self, segment_id: SegmentId) -> Option<SegmentLocation> {
        self.state.read().index.locate(segment_id).cloned()
    }

    fn segment_state(&self, segment_id: SegmentId) -> Option<SegmentState> {
        self.state_of(segment_id)
    }

    fn seal_checkpoint(
        &self,
        range: SegmentRange,
        state_root: Hash,
    ) -> ArchiveResult<CheckpointManifest> {
        self.seal(range, state_root)
    }

    fn replay_checkpoint(&self, id: CheckpointId) -> ArchiveResult<Vec<(SegmentId, Vec<u8>)>> {
        self.replay(id)
    }

    fn checkpoint(&self, id: CheckpointId) -> Option<CheckpointManifest> {
        self.state.read().checkpoints.get(id).cloned()
    }

    fn latest_checkpoint(&self) -> Option<CheckpointManifest> {
        self.state.read().checkpoints.latest().cloned()
    }

    fn high_water_mark(&self) -> Option<SegmentId> {
        self.state.read().index.high_water()
    }

    fn audit(&self) -> ArchiveResult<AuditReport> {
        self.run_audit()
    }
}
