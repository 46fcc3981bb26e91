//! # Finality Archive Flows
//!
//! End-to-end behaviour of qc-18 over the file-backed store:
//!
//! 1. **Archive → seal → restart → replay**: state survives a process restart
//! 2. **Late checkpointing**: enabling an interval seals existing history on open
//! 3. **Damage after restart**: tampered bytes are reported, never returned
//! 4. **Concurrent writers**: parallel archive calls keep the index consistent
//! 5. **Fault injection**: failed writes leave nothing behind

#[cfg(test)]
mod tests {
    use qc_18_finality_archive::domain::types::segment_key;
    use qc_18_finality_archive::test_utils::{make_segment_payload, FaultyKVStore};
    use qc_18_finality_archive::{
        AppendPolicy, ArchiveConfig, ArchiveDependencies, ArchiveError, CompressionParams,
        FileBackedKVStore, FinalityArchiveApi, FinalityArchiveService, KeyValueStore, Namespace,
        SegmentRange, SegmentState, Sha256ContentHasher, WriteMode,
    };
    use rayon::prelude::*;
    use std::path::Path;
    use std::sync::Arc;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    type FileArchive = FinalityArchiveService<FileBackedKVStore>;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn open_file_archive(path: &Path, config: ArchiveConfig) -> FileArchive {
        let kv_store = FileBackedKVStore::open(path).expect("open store");
        FinalityArchiveService::open(
            ArchiveDependencies {
                kv_store,
                hasher: Sha256ContentHasher,
            },
            config,
        )
        .expect("open archive")
    }

    fn archive_ids<KV>(archive: &FinalityArchiveService<KV>, ids: impl IntoIterator<Item = u64>)
    where
        KV: KeyValueStore,
    {
        for id in ids {
            archive
                .archive_segment(id, &make_segment_payload(id, 2048), &CompressionParams::new(3))
                .expect("archive");
        }
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[test]
    fn test_archive_seal_restart_replay() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.db");
        let config = ArchiveConfig::default().with_checkpoint_interval(4);

        let before = {
            let archive = open_file_archive(&path, config.clone());
            archive_ids(&archive, 1..=10);
            let manifests = archive.checkpoints();
            assert_eq!(manifests.len(), 2);
            assert_eq!(manifests[1].range, SegmentRange::new(5, 8).unwrap());
            manifests
        };

        let archive = open_file_archive(&path, config);
        assert_eq!(archive.checkpoints(), before);
        assert_eq!(archive.high_water_mark(), Some(10));
        assert_eq!(archive.segment_state(7), Some(SegmentState::Durable));

        for manifest in &before {
            let replayed = archive.replay_checkpoint(manifest.id).unwrap();
            let ids: Vec<u64> = replayed.iter().map(|(id, _)| *id).collect();
            assert_eq!(ids, manifest.range.ids().collect::<Vec<_>>());
            for (id, payload) in replayed {
                assert_eq!(payload, make_segment_payload(id, 2048));
            }
        }

        // Sealing resumes where the previous process stopped.
        archive_ids(&archive, 11..=12);
        let latest = archive.latest_checkpoint().unwrap();
        assert_eq!(latest.range, SegmentRange::new(9, 12).unwrap());
        assert_eq!(latest.previous, Some(before[1].id));
        assert_eq!(latest.previous_hash, before[1].manifest_hash);
        assert!(archive.audit().unwrap().is_clean());
    }

    #[test]
    fn test_enabling_interval_seals_existing_history() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.db");

        {
            let archive = open_file_archive(&path, ArchiveConfig::default());
            archive_ids(&archive, 1..=9);
            assert!(archive.latest_checkpoint().is_none());
        }

        let archive = open_file_archive(
            &path,
            ArchiveConfig::default().with_checkpoint_interval(3),
        );
        let ranges: Vec<_> = archive.checkpoints().iter().map(|m| m.range).collect();
        assert_eq!(
            ranges,
            vec![
                SegmentRange::new(1, 3).unwrap(),
                SegmentRange::new(4, 6).unwrap(),
                SegmentRange::new(7, 9).unwrap(),
            ]
        );
    }

    #[test]
    fn test_damage_found_after_restart() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.db");

        {
            let archive = open_file_archive(&path, ArchiveConfig::default());
            archive_ids(&archive, 1..=4);
        }

        {
            let store = FileBackedKVStore::open(&path).unwrap();
            let key = segment_key(2);
            let mut envelope = store.get(Namespace::FinalityArchive, &key).unwrap().unwrap();
            let last = envelope.len() - 1;
            envelope[last] ^= 0x01;
            store.put(Namespace::FinalityArchive, &key, &envelope).unwrap();
        }

        let archive = open_file_archive(&path, ArchiveConfig::default());
        assert!(matches!(
            archive.retrieve_segment(2),
            Err(ArchiveError::CorruptedSegment {
                segment_id: Some(2),
                ..
            })
        ));
        assert_eq!(
            archive.retrieve_segment(3).unwrap(),
            make_segment_payload(3, 2048)
        );

        let report = archive.audit().unwrap();
        assert_eq!(report.segments_checked, 4);
        assert_eq!(report.corrupted.len(), 1);
        assert_eq!(report.corrupted[0].segment_id, 2);
    }

    #[test]
    fn test_ordered_writes_over_file_store() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.db");
        let config = ArchiveConfig::default()
            .with_write_mode(WriteMode::DurableThenIndex)
            .with_append_policy(AppendPolicy::Contiguous);

        {
            let archive = open_file_archive(&path, config.clone());
            archive_ids(&archive, 1..=3);
        }

        let archive = open_file_archive(&path, config);
        assert!(matches!(
            archive.archive_segment(5, b"skips four", &CompressionParams::default()),
            Err(ArchiveError::NonMonotonicSegment { .. })
        ));
        archive_ids(&archive, 4..=4);
        assert_eq!(archive.segment_count(), 4);
        assert!(archive.audit().unwrap().orphaned.is_empty());
    }

    #[test]
    fn test_concurrent_writers_keep_index_consistent() {
        init_tracing();
        let archive = Arc::new(
            FinalityArchiveService::in_memory(
                ArchiveConfig::default().with_checkpoint_interval(16),
            )
            .unwrap(),
        );

        let accepted: Vec<u64> = (1..=256u64)
            .into_par_iter()
            .filter(|id| {
                archive
                    .archive_segment(*id, &make_segment_payload(*id, 1024), &CompressionParams::new(1))
                    .is_ok()
            })
            .collect();

        assert!(!accepted.is_empty());
        assert_eq!(archive.segment_count(), accepted.len());
        for id in &accepted {
            assert_eq!(
                archive.retrieve_segment(*id).unwrap(),
                make_segment_payload(*id, 1024)
            );
        }

        for manifest in archive.checkpoints() {
            archive.replay_checkpoint(manifest.id).unwrap();
        }
        assert!(archive.audit().unwrap().is_clean());
    }

    #[test]
    fn test_failed_writes_leave_no_partial_state() {
        init_tracing();
        let store = Arc::new(FaultyKVStore::new());
        let archive = FinalityArchiveService::open(
            ArchiveDependencies {
                kv_store: Arc::clone(&store),
                hasher: Sha256ContentHasher,
            },
            ArchiveConfig::default().with_checkpoint_interval(2),
        )
        .unwrap();

        archive_ids(&archive, 1..=2);
        assert_eq!(archive.checkpoints().len(), 1);

        store.fail_writes(true);
        let result = archive.archive_segment(3, b"lost write", &CompressionParams::default());
        assert!(matches!(result, Err(ArchiveError::StorageIO { .. })));
        assert_eq!(archive.segment_state(3), Some(SegmentState::Failed));
        assert!(archive.locate(3).is_none());

        store.fail_writes(false);
        archive_ids(&archive, 3..=4);
        assert_eq!(archive.checkpoints().len(), 2);

        // Restart over the same store sees exactly what was acknowledged.
        let reopened = FinalityArchiveService::open(
            ArchiveDependencies {
                kv_store: Arc::clone(&store),
                hasher: Sha256ContentHasher,
            },
            ArchiveConfig::default().with_checkpoint_interval(2),
        )
        .unwrap();
        assert_eq!(reopened.segment_count(), 4);
        assert_eq!(reopened.checkpoints(), archive.checkpoints());
        assert!(reopened.audit().unwrap().is_clean());
    }
}
