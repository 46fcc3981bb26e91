//! # Finality Archive Service
//!
//! The main service implementing the Finality Archive API.
//!
//! ## Architecture
//!
//! This service:
//! 1. Implements `FinalityArchiveApi` over any shared `KeyValueStore`
//! 2. Owns the index, the manifest arena and the in-flight table as explicit state
//! 3. Never holds its state lock across compression or store I/O
//!
//! ## Write Path
//!
//! ```text
//! reserve id (lock) → encode + write (no lock) → record index entry (lock) → seal boundaries
//! ```

mod api;
mod archive;
mod audit;
mod checkpoint;
mod recovery;
mod retrieve;

use crate::adapters::infra::Sha256ContentHasher;
use crate::adapters::storage::InMemoryKVStore;
use crate::domain::checkpoint::{CheckpointArena, CheckpointManifest};
use crate::domain::compression::CompressionManager;
use crate::domain::envelope::EnvelopeCodec;
use crate::domain::errors::ArchiveResult;
use crate::domain::index::FinalityIndex;
use crate::domain::segment::{SegmentId, SegmentState};
use crate::domain::types::ArchiveConfig;
use crate::ports::outbound::{ContentHasher, KeyValueStore};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet};

/// Failed ids remembered for `segment_state` queries.
const MAX_TRACKED_FAILURES: usize = 1024;

/// The Finality Archive Service.
pub struct FinalityArchiveService<KV, H = Sha256ContentHasher>
where
    KV: KeyValueStore,
    H: ContentHasher,
{
    /// Shared key-value store.
    pub(crate) kv_store: KV,
    /// Envelope codec (compression manager + content hasher).
    pub(crate) codec: EnvelopeCodec<H>,
    /// Service configuration.
    pub(crate) config: ArchiveConfig,
    /// Index, manifests and in-flight bookkeeping.
    pub(crate) state: RwLock<ArchiveState>,
    /// Serializes manifest sealing so checkpoint ids stay sequential.
    pub(crate) seal_lock: Mutex<()>,
}

/// Mutable archive state. Rebuilt from the store on `open`.
#[derive(Debug, Default)]
pub(crate) struct ArchiveState {
    pub(crate) index: FinalityIndex,
    pub(crate) checkpoints: CheckpointArena,
    /// Ids reserved by a running archive call, with their write-path state.
    pub(crate) in_flight: BTreeMap<SegmentId, SegmentState>,
    pub(crate) failed: BTreeSet<SegmentId>,
    /// Durable checkpoint boundaries not yet covered by a manifest.
    pub(crate) pending_boundaries: BTreeSet<SegmentId>,
}

impl ArchiveState {
    /// Highest id that is indexed or reserved.
    pub(crate) fn high_water(&self) -> Option<SegmentId> {
        let reserved = self.in_flight.keys().next_back().copied();
        self.index.high_water().max(reserved)
    }

    /// Move an in-flight id along the write path.
    pub(crate) fn advance(&mut self, segment_id: SegmentId, next: SegmentState) {
        if let Some(current) = self.in_flight.get_mut(&segment_id) {
            let from = *current;
            if current.advance(next) {
                tracing::debug!("[qc-18] Segment {}: {} → {}", segment_id, from, next);
            } else {
                tracing::warn!(
                    "[qc-18] Segment {}: illegal transition {} → {}",
                    segment_id,
                    from,
                    next
                );
            }
        }
    }

    pub(crate) fn remember_failure(&mut self, segment_id: SegmentId) {
        self.failed.insert(segment_id);
        while self.failed.len() > MAX_TRACKED_FAILURES {
            self.failed.pop_first();
        }
    }
}

/// Dependencies for FinalityArchiveService
pub struct ArchiveDependencies<KV, H> {
    pub kv_store: KV,
    pub hasher: H,
}

impl<KV, H> FinalityArchiveService<KV, H>
where
    KV: KeyValueStore,
    H: ContentHasher,
{
    /// Open the archive over `deps.kv_store`.
    ///
    /// On open, this will:
    /// 1. Validate the configuration
    /// 2. Rebuild the index and manifest chain from the store
    /// 3. Seal any checkpoint boundaries left unsealed by a previous run
    ///
    /// ## Errors
    ///
    /// - `InvalidLevel` / `InvalidConfig`: configuration rejected
    /// - `Serialization` / `CorruptedSegment` / `CorruptedManifest`: persisted state is damaged
    /// - `StorageIO`: the store could not be scanned
    pub fn open(deps: ArchiveDependencies<KV, H>, config: ArchiveConfig) -> ArchiveResult<Self> {
        config.validate()?;
        let manager = CompressionManager::new(config.max_payload_size)?;
        let codec = EnvelopeCodec::new(manager, deps.hasher);

        let state = recovery::recover(&deps.kv_store, codec.hasher(), &config)?;

        let service = Self {
            kv_store: deps.kv_store,
            codec,
            config,
            state: RwLock::new(state),
            seal_lock: Mutex::new(()),
        };
        service.seal_ready_boundaries();
        Ok(service)
    }

    /// Get the service configuration.
    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Get the underlying key-value store.
    pub fn kv_store(&self) -> &KV {
        &self.kv_store
    }

    /// Get the envelope codec.
    pub fn codec(&self) -> &EnvelopeCodec<H> {
        &self.codec
    }

    /// All sealed manifests, oldest first.
    pub fn checkpoints(&self) -> Vec<CheckpointManifest> {
        self.state.read().checkpoints.iter().cloned().collect()
    }

    /// Number of indexed segments.
    pub fn segment_count(&self) -> usize {
        self.state.read().index.len()
    }
}

impl FinalityArchiveService<InMemoryKVStore, Sha256ContentHasher> {
    /// Fresh archive over an in-memory store.
    pub fn in_memory(config: ArchiveConfig) -> ArchiveResult<Self> {
        Self::open(
            ArchiveDependencies {
                kv_store: InMemoryKVStore::new(),
                hasher: Sha256ContentHasher,
            },
            config,
        )
    }
}
