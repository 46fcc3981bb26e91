//! # Audit
//!
//! Re-reads every indexed segment (in parallel) and every manifest, and
//! reports what failed. Read-only: corruption is surfaced, never repaired.

use super::*;
use crate::domain::audit::{AuditReport, ManifestFault};
use crate::domain::checkpoint::{compute_segments_root, CheckpointManifest};
use crate::domain::errors::Hash;
use crate::domain::index::SegmentLocation;
use crate::domain::types::{decode_id_key, Namespace};
use rayon::prelude::*;
use std::time::Instant;

impl<KV, H> FinalityArchiveService<KV, H>
where
    KV: KeyValueStore,
    H: ContentHasher,
{
    pub(crate) fn run_audit(&self) -> ArchiveResult<AuditReport> {
        let started = Instant::now();
        let mut report = AuditReport::new();

        let (locations, manifests, reserved) = {
            let state = self.state.read();
            let locations: Vec<SegmentLocation> =
                state.index.iter().map(|(_, l)| l.clone()).collect();
            let manifests: Vec<CheckpointManifest> = state.checkpoints.iter().cloned().collect();
            let reserved: BTreeSet<SegmentId> = state.in_flight.keys().copied().collect();
            (locations, manifests, reserved)
        };

        // Segments
        let outcomes: Vec<(SegmentId, ArchiveResult<Vec<u8>>)> = locations
            .par_iter()
            .map(|location| (location.segment_id, self.read_verified(location)))
            .collect();
        for (segment_id, outcome) in outcomes {
            match outcome {
                Ok(_) => report.add_verified(segment_id),
                Err(err) if err.is_integrity_failure() => {
                    tracing::error!("[qc-18] ❌ Audit: {}", err);
                    report.add_corrupted(segment_id, err.to_string());
                }
                Err(err) => return Err(err),
            }
        }

        // Orphans: envelopes with no index entry (e.g. crash between ordered writes).
        let indexed: BTreeSet<SegmentId> = locations.iter().map(|l| l.segment_id).collect();
        for (key, _) in self.kv_store.iterate(Namespace::FinalityArchive, &[])? {
            match decode_id_key(&key) {
                Some(id) if indexed.contains(&id) || reserved.contains(&id) => {}
                Some(id) => report.add_orphan(id),
                None => tracing::warn!(
                    "[qc-18] ⚠️ Audit: foreign key 0x{} in {}",
                    hex::encode(&key),
                    Namespace::FinalityArchive
                ),
            }
        }

        // Manifests
        let mut previous: Option<&CheckpointManifest> = None;
        for manifest in &manifests {
            let fault = self
                .check_manifest(manifest, previous)
                .err()
                .map(|reason| ManifestFault {
                    checkpoint_id: manifest.id,
                    reason,
                });
            if let Some(fault) = &fault {
                tracing::error!(
                    "[qc-18] ❌ Audit: checkpoint {} faulty: {}",
                    fault.checkpoint_id,
                    fault.reason
                );
            }
            report.add_manifest(fault);
            previous = Some(manifest);
        }

        report.duration_ms = started.elapsed().as_millis() as u64;

        if report.is_clean() {
            tracing::info!(
                "[qc-18] ✓ Audit clean: {} segments, {} checkpoints, {} orphans ({}ms)",
                report.segments_checked,
                report.manifests_checked,
                report.orphaned.len(),
                report.duration_ms
            );
        } else {
            tracing::warn!(
                "[qc-18] ⚠️ Audit found {} corrupted segments and {} faulty checkpoints",
                report.corrupted.len(),
                report.manifest_faults.len()
            );
        }
        Ok(report)
    }

    /// Compare a manifest against its persisted copy, its predecessor and the index.
    fn check_manifest(
        &self,
        manifest: &CheckpointManifest,
        previous: Option<&CheckpointManifest>,
    ) -> Result<(), String> {
        let hasher = self.codec.hasher();

        let stored = self
            .kv_store
            .get(Namespace::FinalityCheckpoints, &manifest.id.to_key())
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "missing from store".to_string())?;
        let stored: CheckpointManifest =
            bincode::deserialize(&stored).map_err(|e| format!("undecodable: {}", e))?;
        if &stored != manifest {
            return Err("stored copy differs from the loaded chain".to_string());
        }

        stored.verify(hasher).map_err(|e| e.to_string())?;
        if !stored.follows(previous) {
            return Err("broken chain link".to_string());
        }

        let state = self.state.read();
        let missing = state.index.missing_in(stored.range.ids());
        if !missing.is_empty() {
            return Err(format!("{} segment(s) no longer indexed", missing.len()));
        }
        let entries: Vec<(SegmentId, Hash)> = state
            .index
            .range(stored.range.ids())
            .map(|(id, location)| (*id, location.checksum))
            .collect();
        drop(state);

        let root = compute_segments_root(hasher, entries.iter().map(|(id, c)| (*id, c)));
        if root != stored.segments_root {
            return Err("segments root does not match the index".to_string());
        }
        Ok(())
    }
}
