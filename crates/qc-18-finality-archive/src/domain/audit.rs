//! # Audit Report
//!
//! Outcome of a full verification scan over the archive. The scan reads
//! every indexed segment and every manifest; it never repairs anything.

use crate::domain::checkpoint::CheckpointId;
use crate::domain::segment::SegmentId;

// =============================================================================
// AUDIT REPORT
// =============================================================================

/// Result of an archive audit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Number of indexed segments re-read and verified.
    pub segments_checked: u64,
    /// Segments whose envelope failed verification.
    pub corrupted: Vec<AuditFinding>,
    /// Envelopes in `finality_archive` with no index entry.
    pub orphaned: Vec<SegmentId>,
    /// Number of manifests re-verified.
    pub manifests_checked: u64,
    /// Manifests that failed self-hash, chain or root verification.
    pub manifest_faults: Vec<ManifestFault>,
    pub lowest_segment: Option<SegmentId>,
    pub highest_segment: Option<SegmentId>,
    /// Duration of the scan in milliseconds
    pub duration_ms: u64,
}

impl AuditReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// No corruption and no manifest faults. Orphans are reported but harmless.
    pub fn is_clean(&self) -> bool {
        self.corrupted.is_empty() && self.manifest_faults.is_empty()
    }

    pub fn add_verified(&mut self, segment_id: SegmentId) {
        self.segments_checked += 1;

        match self.lowest_segment {
            None => self.lowest_segment = Some(segment_id),
            Some(low) if segment_id < low => self.lowest_segment = Some(segment_id),
            _ => {}
        }
        match self.highest_segment {
            None => self.highest_segment = Some(segment_id),
            Some(high) if segment_id > high => self.highest_segment = Some(segment_id),
            _ => {}
        }
    }

    pub fn add_corrupted(&mut self, segment_id: SegmentId, reason: impl Into<String>) {
        self.segments_checked += 1;
        self.corrupted.push(AuditFinding {
            segment_id,
            reason: reason.into(),
        });
    }

    pub fn add_orphan(&mut self, segment_id: SegmentId) {
        self.orphaned.push(segment_id);
    }

    pub fn add_manifest(&mut self, fault: Option<ManifestFault>) {
        self.manifests_checked += 1;
        if let Some(fault) = fault {
            self.manifest_faults.push(fault);
        }
    }
}

/// A segment that failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditFinding {
    pub segment_id: SegmentId,
    pub reason: String,
}

/// A manifest that failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFault {
    pub checkpoint_id: CheckpointId,
    pub reason: String,
}
