//! # Segment Envelope Codec
//!
//! Encodes a raw payload into `[length][checksum][body]` and decodes it back,
//! verifying the checksum over the recovered payload before returning it.

use super::security::{
    max_envelope_len, CHECKSUM_FIELD_SIZE, ENVELOPE_HEADER_SIZE, LENGTH_FIELD_SIZE,
};
use crate::adapters::infra::Sha256ContentHasher;
use crate::domain::compression::security::MAX_PAYLOAD_SIZE;
use crate::domain::compression::{CompressionManager, CompressionParams, Transform};
use crate::domain::errors::{ArchiveError, ArchiveResult, CorruptionReason, Hash};
use crate::ports::outbound::ContentHasher;

// =============================================================================
// ENVELOPE HEADER
// =============================================================================

/// Fixed-size envelope header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeHeader {
    /// Length of the uncompressed payload.
    pub payload_len: u64,
    /// Content hash of the uncompressed payload.
    pub checksum: Hash,
}

impl EnvelopeHeader {
    /// Serialize to the on-disk layout.
    pub fn to_bytes(&self) -> [u8; ENVELOPE_HEADER_SIZE] {
        let mut out = [0u8; ENVELOPE_HEADER_SIZE];
        out[..LENGTH_FIELD_SIZE].copy_from_slice(&self.payload_len.to_le_bytes());
        out[LENGTH_FIELD_SIZE..].copy_from_slice(&self.checksum);
        out
    }

    /// Split an envelope into its header and body.
    pub fn parse(bytes: &[u8]) -> ArchiveResult<(Self, &[u8])> {
        if bytes.len() < ENVELOPE_HEADER_SIZE {
            return Err(ArchiveError::MalformedEnvelope {
                reason: format!(
                    "{} bytes is shorter than the {}-byte header",
                    bytes.len(),
                    ENVELOPE_HEADER_SIZE
                ),
            });
        }

        let (header, body) = bytes.split_at(ENVELOPE_HEADER_SIZE);
        let mut len_bytes = [0u8; LENGTH_FIELD_SIZE];
        len_bytes.copy_from_slice(&header[..LENGTH_FIELD_SIZE]);
        let mut checksum = [0u8; CHECKSUM_FIELD_SIZE];
        checksum.copy_from_slice(&header[LENGTH_FIELD_SIZE..]);

        Ok((
            Self {
                payload_len: u64::from_le_bytes(len_bytes),
                checksum,
            },
            body,
        ))
    }
}

// =============================================================================
// ENVELOPE CODEC
// =============================================================================

/// Envelope encoder/decoder bound to a compression manager and content hasher.
#[derive(Debug, Clone)]
pub struct EnvelopeCodec<H: ContentHasher = Sha256ContentHasher> {
    manager: CompressionManager,
    hasher: H,
}

impl Default for EnvelopeCodec<Sha256ContentHasher> {
    fn default() -> Self {
        Self::new(CompressionManager::default(), Sha256ContentHasher)
    }
}

impl<H: ContentHasher> EnvelopeCodec<H> {
    pub fn new(manager: CompressionManager, hasher: H) -> Self {
        Self { manager, hasher }
    }

    pub fn manager(&self) -> &CompressionManager {
        &self.manager
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Frame `payload` with the transform `params` selects.
    pub fn encode(&self, payload: &[u8], params: &CompressionParams) -> ArchiveResult<Vec<u8>> {
        let transform = params.transform()?;
        self.encode_with(payload, transform).map(|(bytes, _)| bytes)
    }

    /// Decode an envelope written with `params`.
    ///
    /// Only `params.enabled` matters here; the level is a write-side knob.
    pub fn decode(&self, bytes: &[u8], params: &CompressionParams) -> ArchiveResult<Vec<u8>> {
        let transform = params.transform()?;
        self.decode_with(bytes, transform)
    }

    /// Encode and also return the header that was written.
    pub(crate) fn encode_with(
        &self,
        payload: &[u8],
        transform: Transform,
    ) -> ArchiveResult<(Vec<u8>, EnvelopeHeader)> {
        if payload.is_empty() {
            return Err(ArchiveError::EmptyPayload);
        }

        // Checksum is taken over the raw payload, before any transform.
        let header = EnvelopeHeader {
            payload_len: payload.len() as u64,
            checksum: self.hasher.hash(payload),
        };
        let body = self.manager.compress_with(payload, transform)?;

        let bound = max_envelope_len(payload.len(), transform);
        if ENVELOPE_HEADER_SIZE + body.len() > bound {
            return Err(ArchiveError::CompressionFailed {
                reason: format!(
                    "envelope of {} bytes exceeds worst-case bound {}",
                    ENVELOPE_HEADER_SIZE + body.len(),
                    bound
                ),
            });
        }

        let mut out = Vec::with_capacity(ENVELOPE_HEADER_SIZE + body.len());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(&body);
        Ok((out, header))
    }

    /// Decode and verify. Never returns a payload whose checksum was not checked.
    pub(crate) fn decode_with(&self, bytes: &[u8], transform: Transform) -> ArchiveResult<Vec<u8>> {
        let (header, body) = EnvelopeHeader::parse(bytes)?;

        let expected_len =
            usize::try_from(header.payload_len).map_err(|_| ArchiveError::MalformedEnvelope {
                reason: format!("length field {} does not fit in memory", header.payload_len),
            })?;
        if expected_len == 0 || body.is_empty() {
            return Err(ArchiveError::MalformedEnvelope {
                reason: "envelope carries no payload".to_string(),
            });
        }
        // The configured ceiling only gates writes; reads are bounded by the hard limit.
        if expected_len > MAX_PAYLOAD_SIZE {
            return Err(ArchiveError::MalformedEnvelope {
                reason: format!(
                    "length field {} exceeds payload limit {}",
                    expected_len, MAX_PAYLOAD_SIZE
                ),
            });
        }

        let payload = self
            .manager
            .decompress_with(body, expected_len, transform)
            .map_err(|err| match err {
                ArchiveError::DecompressionFailed { reason } => {
                    ArchiveError::corrupted(CorruptionReason::Decompression(reason))
                }
                ArchiveError::SizeMismatch { expected, actual } => {
                    ArchiveError::corrupted(CorruptionReason::LengthMismatch { expected, actual })
                }
                other => other,
            })?;

        let actual = self.hasher.hash(&payload);
        if actual != header.checksum {
            return Err(ArchiveError::corrupted(CorruptionReason::ChecksumMismatch {
                expected: header.checksum,
                actual,
            }));
        }

        Ok(payload)
    }
}
