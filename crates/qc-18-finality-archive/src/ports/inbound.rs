//! # Inbound Ports (Driving Ports)
//!
//! The primary API for the Finality Archive subsystem.

use crate::domain::audit::AuditReport;
use crate::domain::checkpoint::{CheckpointId, CheckpointManifest, SegmentRange};
use crate::domain::compression::CompressionParams;
use crate::domain::errors::{ArchiveResult, Hash};
use crate::domain::index::SegmentLocation;
use crate::domain::segment::{SegmentId, SegmentState};

/// Primary API for the Finality Archive.
///
/// Every method takes `&self`; implementations are safe to share across
/// worker threads.
pub trait FinalityArchiveApi: Send + Sync {
    /// Archive one finalized segment.
    ///
    /// ## Ordering
    ///
    /// The envelope is durable before the index entry is visible. A failed call
    /// leaves no index entry, so retrying the same id is safe.
    ///
    /// ## Errors
    ///
    /// - `EmptyPayload`, `PayloadTooLarge`, `InvalidLevel`: rejected before any write
    /// - `NonMonotonicSegment`: id violates the append policy
    /// - `IndexConflict`: id already archived with different content
    /// - `SegmentInFlight`: another caller is archiving this id
    /// - `StorageIO`: the store rejected the write
    fn archive_segment(
        &self,
        segment_id: SegmentId,
        payload: &[u8],
        params: &CompressionParams,
    ) -> ArchiveResult<SegmentLocation>;

    /// Read back and verify one segment.
    ///
    /// ## Errors
    ///
    /// - `NotFound`: no index entry
    /// - `CorruptedSegment`: present but failed verification
    /// - `StorageIO`: the store rejected the read
    fn retrieve_segment(&self, segment_id: SegmentId) -> ArchiveResult<Vec<u8>>;

    /// Pure index lookup.
    fn locate(&self, segment_id: SegmentId) -> Option<SegmentLocation>;

    /// Write-path state of a segment seen by this instance.
    ///
    /// Indexed segments report `Durable` even after a restart.
    fn segment_state(&self, segment_id: SegmentId) -> Option<SegmentState>;

    /// Seal a manifest over a fully indexed range.
    ///
    /// ## Errors
    ///
    /// - `IncompleteRange`: at least one id in `range` has no index entry
    /// - `StorageIO`: the manifest could not be persisted
    fn seal_checkpoint(
        &self,
        range: SegmentRange,
        state_root: Hash,
    ) -> ArchiveResult<CheckpointManifest>;

    /// Re-retrieve every segment of a manifest and check its root.
    ///
    /// Returns payloads ordered by segment id.
    ///
    /// ## Errors
    ///
    /// - `CheckpointNotFound`: unknown id
    /// - `CorruptedSegment` / `NotFound`: a segment in the range failed to load
    /// - `CorruptedManifest`: recomputed root differs from the sealed one
    fn replay_checkpoint(&self, id: CheckpointId) -> ArchiveResult<Vec<(SegmentId, Vec<u8>)>>;

    /// Manifest by id.
    fn checkpoint(&self, id: CheckpointId) -> Option<CheckpointManifest>;

    /// Most recent manifest.
    fn latest_checkpoint(&self) -> Option<CheckpointManifest>;

    /// Highest indexed segment id.
    fn high_water_mark(&self) -> Option<SegmentId>;

    /// Full verification scan. Never repairs.
    fn audit(&self) -> ArchiveResult<AuditReport>;
}
