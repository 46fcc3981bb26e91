//! # Finality Archive (qc-18)
//!
//! The Finality Archive persists finalized ledger segments as compressed,
//! checksummed envelopes and keeps the bookkeeping needed to find, verify and
//! replay them. It is the canonical store of finalized history.
//!
//! ## Architecture
//!
//! ```text
//! Consensus ──finalized payload──→ Archive Store
//!                                      │
//!                    Compression Manager (zstd / identity, bounded)
//!                                      │
//!                    Envelope Codec [len][checksum][body]
//!                                      │
//!          finality_archive ←──────────┴──────────→ finality_index
//!                                                        │
//!                                      Checkpoint Manager → finality_checkpoints
//! ```
//!
//! Reads reverse the path and fail closed on any integrity mismatch.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Description |
//! |----|-----------|-------------|
//! | 1 | Envelope Integrity | `length == len(payload)` and `checksum == hash(payload)` |
//! | 2 | Bounded Resources | Level in [1, 21], payload ≤ 8 MiB, decode bounded by length field |
//! | 3 | Write Before Index | No index entry without a durable envelope |
//! | 4 | Immutable Index | An id maps to one location forever |
//! | 5 | Append Policy | New ids respect the high-water mark |
//! | 6 | Complete Checkpoints | A manifest covers only fully indexed ranges |
//! | 7 | Fail Closed | Unverified bytes are never returned |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Pure logic (compression, envelope, index, checkpoints)
//! - `ports/` - Port traits (inbound API, outbound SPI)
//! - `adapters/` - Storage backends and the SHA-256 hasher
//! - `service/` - Application service implementing the API
//!
//! ## Usage
//!
//! ```ignore
//! use qc_18_finality_archive::{ArchiveConfig, CompressionParams, FinalityArchiveApi, FinalityArchiveService};
//!
//! let archive = FinalityArchiveService::in_memory(ArchiveConfig::default())?;
//!
//! let location = archive.archive_segment(1, b"hello-finality-data", &CompressionParams::new(3))?;
//! let payload = archive.retrieve_segment(1)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Test fixtures.
///
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export key types for convenience
pub use adapters::infra::Sha256ContentHasher;
pub use adapters::storage::{FileBackedKVStore, InMemoryKVStore};
#[cfg(feature = "rocksdb")]
pub use adapters::storage::{RocksDbConfig, RocksDbStore};
pub use domain::audit::{AuditFinding, AuditReport, ManifestFault};
pub use domain::checkpoint::{CheckpointId, CheckpointManifest, SegmentRange};
pub use domain::compression::{CompressionManager, CompressionParams, Transform};
pub use domain::envelope::{EnvelopeCodec, EnvelopeHeader};
pub use domain::errors::{
    ArchiveError, ArchiveResult, CorruptionReason, Hash, KVStoreError,
};
pub use domain::index::{FinalityIndex, SegmentLocation};
pub use domain::segment::{SegmentId, SegmentState};
pub use domain::types::{AppendPolicy, ArchiveConfig, Namespace, WriteMode};
pub use ports::inbound::FinalityArchiveApi;
pub use ports::outbound::{BatchOperation, ContentHasher, KeyValueStore};
pub use service::{ArchiveDependencies, FinalityArchiveService};
