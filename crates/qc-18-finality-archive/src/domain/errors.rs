//! # Domain Errors
//!
//! Error types for the Finality Archive subsystem.
//!
//! ## Design Principles
//!
//! - Every integrity or bounds failure is terminal for the operation
//! - `NotFound` (missing) and `CorruptedSegment` (present but untrusted) stay distinct
//! - Only `StorageIO` and `SegmentInFlight` are safe to retry with the same segment id

use crate::domain::checkpoint::CheckpointId;
use crate::domain::segment::SegmentId;
use std::fmt;
use thiserror::Error;

/// 32-byte content digest.
pub type Hash = [u8; 32];

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors that can occur while archiving or retrieving finality data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArchiveError {
    /// Compression level outside the accepted closed range.
    #[error("Invalid compression level {level}: must be within [{min}, {max}]")]
    InvalidLevel { level: i32, min: i32, max: i32 },

    /// Payload exceeds the configured ceiling.
    #[error("Payload too large: {size} bytes, max {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },

    /// Segments are never empty.
    #[error("Empty payload: a finalized segment must carry at least one byte")]
    EmptyPayload,

    /// The block compressor rejected the input.
    #[error("Compression failed: {reason}")]
    CompressionFailed { reason: String },

    /// The block decompressor rejected the input.
    #[error("Decompression failed: {reason}")]
    DecompressionFailed { reason: String },

    /// Decompressed output length differs from the length announced by the envelope.
    #[error("Size mismatch: expected {expected} bytes, got {actual} bytes")]
    SizeMismatch { expected: usize, actual: usize },

    /// Envelope framing could not be parsed.
    #[error("Malformed envelope: {reason}")]
    MalformedEnvelope { reason: String },

    /// Stored bytes failed verification and must not be returned.
    #[error("Corrupted segment{}: {reason}", fmt_segment(.segment_id))]
    CorruptedSegment {
        segment_id: Option<SegmentId>,
        reason: CorruptionReason,
    },

    /// No index entry exists for this segment.
    #[error("Segment {segment_id} not found")]
    NotFound { segment_id: SegmentId },

    /// Segment id already maps to a different location.
    #[error("Index conflict: segment {segment_id} already archived with different content")]
    IndexConflict { segment_id: SegmentId },

    /// Checkpoint range references segments without index entries.
    #[error("Incomplete range [{start}, {end}]: {} segment(s) not archived, first missing {}", .missing.len(), .missing.first().copied().unwrap_or_default())]
    IncompleteRange {
        start: SegmentId,
        end: SegmentId,
        missing: Vec<SegmentId>,
    },

    /// Segment id violates the configured append policy.
    #[error("Non-monotonic segment {segment_id}: high-water mark is {high_water}")]
    NonMonotonicSegment {
        segment_id: SegmentId,
        high_water: SegmentId,
    },

    /// Another writer currently holds this segment id.
    #[error("Segment {segment_id} is already being archived")]
    SegmentInFlight { segment_id: SegmentId },

    /// Range bounds are inverted.
    #[error("Invalid range: start {start} is greater than end {end}")]
    InvalidRange { start: SegmentId, end: SegmentId },

    /// No manifest with this id exists.
    #[error("Checkpoint {id} not found")]
    CheckpointNotFound { id: CheckpointId },

    /// Manifest failed its self-hash, chain link or replay verification.
    #[error("Corrupted checkpoint manifest {id}: {reason}")]
    CorruptedManifest { id: CheckpointId, reason: String },

    /// Failure surfaced by the key-value interface.
    #[error("Storage I/O error: {message}")]
    StorageIO { message: String },

    /// Index entry or manifest could not be (de)serialized.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Configuration rejected at construction time.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

fn fmt_segment(segment_id: &Option<SegmentId>) -> String {
    segment_id
        .map(|id| format!(" {}", id))
        .unwrap_or_default()
}

impl ArchiveError {
    /// Whether the caller may retry the same operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ArchiveError::StorageIO { .. } | ArchiveError::SegmentInFlight { .. }
        )
    }

    /// Whether this error means stored data can no longer be trusted.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            ArchiveError::CorruptedSegment { .. } | ArchiveError::CorruptedManifest { .. }
        )
    }

    /// Attach the segment id to a corruption error raised below the store.
    pub(crate) fn for_segment(self, id: SegmentId) -> Self {
        match self {
            ArchiveError::CorruptedSegment { reason, .. } => ArchiveError::CorruptedSegment {
                segment_id: Some(id),
                reason,
            },
            other => other,
        }
    }

    pub(crate) fn corrupted(reason: CorruptionReason) -> Self {
        ArchiveError::CorruptedSegment {
            segment_id: None,
            reason,
        }
    }
}

/// Why a stored segment was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorruptionReason {
    /// Recomputed content hash differs from the stored one.
    ChecksumMismatch { expected: Hash, actual: Hash },
    /// Stored bytes are not a valid compressed frame.
    Decompression(String),
    /// Recovered payload length differs from the envelope length field.
    LengthMismatch { expected: usize, actual: usize },
    /// Index entry exists but the envelope bytes do not.
    MissingEnvelope,
    /// Envelope bytes disagree with the index entry that points at them.
    LocationMismatch,
}

impl fmt::Display for CorruptionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorruptionReason::ChecksumMismatch { expected, actual } => write!(
                f,
                "checksum mismatch (expected 0x{}, got 0x{})",
                hex::encode(&expected[..4]),
                hex::encode(&actual[..4])
            ),
            CorruptionReason::Decompression(reason) => {
                write!(f, "stored frame rejected by decompressor: {}", reason)
            }
            CorruptionReason::LengthMismatch { expected, actual } => write!(
                f,
                "length mismatch (envelope says {}, recovered {})",
                expected, actual
            ),
            CorruptionReason::MissingEnvelope => write!(f, "indexed envelope is missing"),
            CorruptionReason::LocationMismatch => {
                write!(f, "envelope does not match its index entry")
            }
        }
    }
}

/// Key-value store errors.
#[derive(Debug, Clone, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },
    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

impl From<KVStoreError> for ArchiveError {
    fn from(err: KVStoreError) -> Self {
        ArchiveError::StorageIO {
            message: err.to_string(),
        }
    }
}

impl From<bincode::Error> for ArchiveError {
    fn from(err: bincode::Error) -> Self {
        ArchiveError::Serialization {
            message: err.to_string(),
        }
    }
}
