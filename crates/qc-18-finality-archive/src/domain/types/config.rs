//! # Archive Configuration

use crate::domain::compression::security::MAX_PAYLOAD_SIZE;
use crate::domain::compression::CompressionParams;
use crate::domain::errors::{ArchiveError, ArchiveResult};
use std::env;
use std::str::FromStr;

/// How new segment ids relate to the current high-water mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppendPolicy {
    /// Id must exceed the high-water mark; gaps allowed.
    #[default]
    Monotonic,
    /// Id must be exactly high-water + 1. The first id is free.
    Contiguous,
}

impl FromStr for AppendPolicy {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monotonic" => Ok(AppendPolicy::Monotonic),
            "contiguous" => Ok(AppendPolicy::Contiguous),
            other => Err(ArchiveError::InvalidConfig {
                reason: format!("unknown append policy '{}'", other),
            }),
        }
    }
}

/// How the envelope and its index entry reach the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Envelope and index entry in one atomic batch.
    #[default]
    AtomicBatch,
    /// Envelope put first; index entry put only after it is acknowledged.
    DurableThenIndex,
}

impl FromStr for WriteMode {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "atomic" | "batch" => Ok(WriteMode::AtomicBatch),
            "ordered" | "durable-then-index" => Ok(WriteMode::DurableThenIndex),
            other => Err(ArchiveError::InvalidConfig {
                reason: format!("unknown write mode '{}'", other),
            }),
        }
    }
}

/// Configuration for a Finality Archive instance.
///
/// Checksum verification on read is not configurable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveConfig {
    /// Default parameters for callers that do not bring their own.
    pub compression: CompressionParams,

    /// Payload ceiling in bytes (default: 8 MiB, may only be lowered).
    pub max_payload_size: usize,

    pub append_policy: AppendPolicy,

    pub write_mode: WriteMode,

    /// Seal a manifest automatically at every multiple of this id.
    ///
    /// `None` (default) leaves sealing entirely to the caller.
    pub checkpoint_interval: Option<u64>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            compression: CompressionParams::default(),
            max_payload_size: MAX_PAYLOAD_SIZE,
            append_policy: AppendPolicy::Monotonic,
            write_mode: WriteMode::AtomicBatch,
            checkpoint_interval: None,
        }
    }
}

impl ArchiveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(mut self, params: CompressionParams) -> Self {
        self.compression = params;
        self
    }

    pub fn with_max_payload_size(mut self, size: usize) -> Self {
        self.max_payload_size = size;
        self
    }

    pub fn with_append_policy(mut self, policy: AppendPolicy) -> Self {
        self.append_policy = policy;
        self
    }

    pub fn with_write_mode(mut self, mode: WriteMode) -> Self {
        self.write_mode = mode;
        self
    }

    pub fn with_checkpoint_interval(mut self, interval: u64) -> Self {
        self.checkpoint_interval = Some(interval);
        self
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_ARCHIVE_COMPRESSION_LEVEL`: Zstd level (default: 3)
    /// - `QC_ARCHIVE_COMPRESSION`: Enable compression (default: true)
    /// - `QC_ARCHIVE_MAX_PAYLOAD`: Payload ceiling in bytes (default: 8388608)
    /// - `QC_ARCHIVE_APPEND_POLICY`: `monotonic` or `contiguous` (default: monotonic)
    /// - `QC_ARCHIVE_WRITE_MODE`: `atomic` or `ordered` (default: atomic)
    /// - `QC_ARCHIVE_CHECKPOINT_INTERVAL`: Auto-seal interval (default: unset)
    ///
    /// Unparsable values fall back to the default; call [`validate`](Self::validate)
    /// before use.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let level = lookup("QC_ARCHIVE_COMPRESSION_LEVEL")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.compression.level);
        let enabled = lookup("QC_ARCHIVE_COMPRESSION")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(defaults.compression.enabled);

        Self {
            compression: CompressionParams { level, enabled },
            max_payload_size: lookup("QC_ARCHIVE_MAX_PAYLOAD")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_payload_size),
            append_policy: lookup("QC_ARCHIVE_APPEND_POLICY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.append_policy),
            write_mode: lookup("QC_ARCHIVE_WRITE_MODE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.write_mode),
            checkpoint_interval: lookup("QC_ARCHIVE_CHECKPOINT_INTERVAL")
                .and_then(|v| v.trim().parse().ok()),
        }
    }

    /// ## Errors
    ///
    /// - `InvalidLevel`: default compression level outside [1, 21]
    /// - `InvalidConfig`: ceiling outside [1, 8 MiB] or a zero checkpoint interval
    pub fn validate(&self) -> ArchiveResult<()> {
        self.compression.transform()?;

        if self.max_payload_size == 0 || self.max_payload_size > MAX_PAYLOAD_SIZE {
            return Err(ArchiveError::InvalidConfig {
                reason: format!(
                    "max_payload_size must be within [1, {}], got {}",
                    MAX_PAYLOAD_SIZE, self.max_payload_size
                ),
            });
        }
        if self.checkpoint_interval == Some(0) {
            return Err(ArchiveError::InvalidConfig {
                reason: "checkpoint_interval must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
