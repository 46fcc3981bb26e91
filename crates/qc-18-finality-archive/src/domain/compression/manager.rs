//! # Compression Manager
//!
//! Stateless wrapper around the Zstd block compressor.
//!
//! Disabling compression swaps the transform for an identity copy; the
//! payload ceiling, level range and length checks run in both modes.

use super::security::{
    validate_frame_header, validate_level, validate_payload_size, DEFAULT_LEVEL,
    FRAME_WINDOW_LOG, MAX_PAYLOAD_SIZE,
};
use crate::domain::errors::{ArchiveError, ArchiveResult};
use serde::{Deserialize, Serialize};
use zstd::zstd_safe::CParameter;

// =============================================================================
// COMPRESSION PARAMETERS
// =============================================================================

/// Compression parameters supplied per archive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionParams {
    /// Compression level (1-21, default 3)
    pub level: i32,
    /// Enable compression
    pub enabled: bool,
}

impl Default for CompressionParams {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            enabled: true,
        }
    }
}

impl CompressionParams {
    /// Compression enabled at `level`.
    pub fn new(level: i32) -> Self {
        Self {
            level,
            enabled: true,
        }
    }

    /// Compression disabled (identity transform).
    pub fn disabled() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            enabled: false,
        }
    }

    /// Resolve the transform these parameters select.
    ///
    /// The level is validated even when compression is disabled.
    pub fn transform(&self) -> ArchiveResult<Transform> {
        validate_level(self.level)?;
        Ok(if self.enabled {
            Transform::Codec { level: self.level }
        } else {
            Transform::Identity
        })
    }
}

/// The byte transform applied between the raw payload and the stored body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transform {
    /// Stored body is the raw payload.
    Identity,
    /// Stored body is a Zstd frame.
    Codec { level: i32 },
}

impl Transform {
    /// Whether the stored body is compressed.
    pub fn is_compressed(&self) -> bool {
        matches!(self, Transform::Codec { .. })
    }

    /// Upper bound on the stored body length for a payload of `len` bytes.
    pub fn worst_case_len(&self, len: usize) -> usize {
        match self {
            Transform::Identity => len,
            Transform::Codec { .. } => zstd::zstd_safe::compress_bound(len),
        }
    }
}

// =============================================================================
// COMPRESSION MANAGER
// =============================================================================

/// Bounded compressor/decompressor. Holds no state beyond its ceiling.
#[derive(Debug, Clone, Copy)]
pub struct CompressionManager {
    max_payload_size: usize,
}

impl Default for CompressionManager {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD_SIZE,
        }
    }
}

impl CompressionManager {
    /// Create a manager with a custom ceiling.
    ///
    /// The ceiling may be lowered below 8 MiB but never raised above it.
    pub fn new(max_payload_size: usize) -> ArchiveResult<Self> {
        if max_payload_size == 0 || max_payload_size > MAX_PAYLOAD_SIZE {
            return Err(ArchiveError::InvalidConfig {
                reason: format!(
                    "payload ceiling must be within [1, {}], got {}",
                    MAX_PAYLOAD_SIZE, max_payload_size
                ),
            });
        }
        Ok(Self { max_payload_size })
    }

    /// The configured payload ceiling. Applies to writes only.
    pub fn max_payload_size(&self) -> usize {
        self.max_payload_size
    }

    /// Compress `payload` with the transform `params` selects.
    ///
    /// ## Errors
    ///
    /// - `InvalidLevel`: level outside [1, 21]
    /// - `PayloadTooLarge`: payload above the ceiling
    /// - `CompressionFailed`: codec error
    pub fn compress(&self, payload: &[u8], params: &CompressionParams) -> ArchiveResult<Vec<u8>> {
        let transform = params.transform()?;
        self.compress_with(payload, transform)
    }

    /// Decompress `data` that must expand to exactly `expected_len` bytes.
    ///
    /// ## Errors
    ///
    /// - `PayloadTooLarge`: `expected_len` above the 8 MiB hard limit (checked before decoding)
    /// - `DecompressionFailed`: codec error, a frame header the encoder would not
    ///   write, or output larger than `expected_len`
    /// - `SizeMismatch`: output shorter than `expected_len`
    pub fn decompress(
        &self,
        data: &[u8],
        expected_len: usize,
        params: &CompressionParams,
    ) -> ArchiveResult<Vec<u8>> {
        let transform = params.transform()?;
        self.decompress_with(data, expected_len, transform)
    }

    pub(crate) fn compress_with(
        &self,
        payload: &[u8],
        transform: Transform,
    ) -> ArchiveResult<Vec<u8>> {
        validate_payload_size(payload.len(), self.max_payload_size)?;

        match transform {
            Transform::Identity => Ok(payload.to_vec()),
            Transform::Codec { level } => {
                validate_level(level)?;
                compress_frame(payload, level).map_err(|e| ArchiveError::CompressionFailed {
                    reason: e.to_string(),
                })
            }
        }
    }

    pub(crate) fn decompress_with(
        &self,
        data: &[u8],
        expected_len: usize,
        transform: Transform,
    ) -> ArchiveResult<Vec<u8>> {
        // Segments written under a higher ceiling stay readable after it is lowered.
        validate_payload_size(expected_len, MAX_PAYLOAD_SIZE)?;

        let output = match transform {
            Transform::Identity => data.to_vec(),
            Transform::Codec { .. } => {
                validate_frame_header(data, expected_len)?;
                // Capacity is the hard output limit: larger frames error out.
                zstd::bulk::decompress(data, expected_len).map_err(|e| {
                    ArchiveError::DecompressionFailed {
                        reason: e.to_string(),
                    }
                })?
            }
        };

        if output.len() != expected_len {
            return Err(ArchiveError::SizeMismatch {
                expected: expected_len,
                actual: output.len(),
            });
        }
        Ok(output)
    }
}

fn compress_frame(payload: &[u8], level: i32) -> std::io::Result<Vec<u8>> {
    let mut compressor = zstd::bulk::Compressor::new(level)?;
    compressor.set_parameter(CParameter::WindowLog(FRAME_WINDOW_LOG))?;
    compressor.set_parameter(CParameter::ContentSizeFlag(true))?;
    compressor.set_parameter(CParameter::ChecksumFlag(false))?;
    compressor.compress(payload)
}
