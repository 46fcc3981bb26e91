//! # Compression Security
//!
//! Resource bounds for compression operations.
//!
//! ## Security Invariants
//!
//! - Input size is bounded before the compressor ever runs
//! - Output size on decompression is known ahead of time (no decompression bombs)
//! - Compression level stays inside a closed range

use crate::domain::errors::{ArchiveError, ArchiveResult};

/// Lowest accepted compression level.
pub const MIN_LEVEL: i32 = 1;

/// Highest accepted compression level.
pub const MAX_LEVEL: i32 = 21;

/// Default compression level.
pub const DEFAULT_LEVEL: i32 = 3;

/// Payload ceiling (8 MiB) for a single segment.
pub const MAX_PAYLOAD_SIZE: usize = 8 * 1024 * 1024;

/// Window log pinned on the encoder. A window of 8 MiB covers every payload,
/// so each frame is emitted as a single segment with its content size.
pub const FRAME_WINDOW_LOG: u32 = 23;

const _: () = assert!(1usize << FRAME_WINDOW_LOG >= MAX_PAYLOAD_SIZE);

/// Zstd frame magic number, little-endian on the wire.
pub const FRAME_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

const SINGLE_SEGMENT_FLAG: u8 = 0x20;
const UNUSED_BIT: u8 = 0x10;
const RESERVED_BIT: u8 = 0x08;
const CONTENT_CHECKSUM_FLAG: u8 = 0x04;
const DICTIONARY_ID_MASK: u8 = 0x03;

/// Validate a compression level.
pub fn validate_level(level: i32) -> ArchiveResult<()> {
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        return Err(ArchiveError::InvalidLevel {
            level,
            min: MIN_LEVEL,
            max: MAX_LEVEL,
        });
    }
    Ok(())
}

/// Validate a payload (or announced output) size against a ceiling.
pub fn validate_payload_size(size: usize, max: usize) -> ArchiveResult<()> {
    if size > max {
        return Err(ArchiveError::PayloadTooLarge { size, max });
    }
    Ok(())
}

/// Check a stored frame header against the layout the encoder emits.
///
/// The encoder writes single-segment frames with a declared content size and
/// no dictionary or content checksum. Zstd itself ignores some descriptor
/// bits, so the descriptor is matched exactly and the declared size must
/// equal `expected_len`.
pub fn validate_frame_header(frame: &[u8], expected_len: usize) -> ArchiveResult<()> {
    let reject = |reason: String| ArchiveError::DecompressionFailed { reason };

    if frame.len() <= FRAME_MAGIC.len() || frame[..FRAME_MAGIC.len()] != FRAME_MAGIC {
        return Err(reject("missing zstd frame magic".to_string()));
    }
    let descriptor = frame[FRAME_MAGIC.len()];

    if descriptor & SINGLE_SEGMENT_FLAG == 0 {
        return Err(reject(format!(
            "frame descriptor 0x{:02x} is not single-segment",
            descriptor
        )));
    }
    let foreign = UNUSED_BIT | RESERVED_BIT | CONTENT_CHECKSUM_FLAG | DICTIONARY_ID_MASK;
    if descriptor & foreign != 0 {
        return Err(reject(format!(
            "frame descriptor 0x{:02x} sets bits the encoder never writes",
            descriptor
        )));
    }

    let field_size = match descriptor >> 6 {
        0 => 1,
        1 => 2,
        2 => 4,
        _ => 8,
    };
    let start = FRAME_MAGIC.len() + 1;
    let field = frame
        .get(start..start + field_size)
        .ok_or_else(|| reject("frame header truncated".to_string()))?;

    let mut raw = [0u8; 8];
    raw[..field_size].copy_from_slice(field);
    let mut declared = u64::from_le_bytes(raw);
    if field_size == 2 {
        declared += 256;
    }

    if declared != expected_len as u64 {
        return Err(reject(format!(
            "frame declares {} bytes, envelope says {}",
            declared, expected_len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_bounds() {
        assert!(validate_level(MIN_LEVEL).is_ok());
        assert!(validate_level(MAX_LEVEL).is_ok());
        assert!(matches!(
            validate_level(0),
            Err(ArchiveError::InvalidLevel { level: 0, .. })
        ));
        assert!(matches!(
            validate_level(22),
            Err(ArchiveError::InvalidLevel { level: 22, .. })
        ));
        assert!(validate_level(-5).is_err());
    }

    #[test]
    fn test_frame_header_checks() {
        // Single segment, 1-byte content size of 5.
        let mut frame = FRAME_MAGIC.to_vec();
        frame.extend_from_slice(&[0x20, 5, 0x11, 0x22, 0x33]);
        assert!(validate_frame_header(&frame, 5).is_ok());
        assert!(validate_frame_header(&frame, 6).is_err());

        for bit in 0..8 {
            let mut flipped = frame.clone();
            flipped[4] ^= 1 << bit;
            assert!(
                validate_frame_header(&flipped, 5).is_err(),
                "descriptor bit {} accepted",
                bit
            );
        }

        // Two-byte content size is offset by 256.
        let mut wide = FRAME_MAGIC.to_vec();
        wide.extend_from_slice(&[0x60, 0x04, 0x00, 0, 0]);
        assert!(validate_frame_header(&wide, 260).is_ok());

        assert!(validate_frame_header(&FRAME_MAGIC, 5).is_err());
        assert!(validate_frame_header(&[0u8; 9], 5).is_err());
    }

    #[test]
    fn test_payload_ceiling() {
        assert!(validate_payload_size(MAX_PAYLOAD_SIZE, MAX_PAYLOAD_SIZE).is_ok());
        assert!(matches!(
            validate_payload_size(MAX_PAYLOAD_SIZE + 1, MAX_PAYLOAD_SIZE),
            Err(ArchiveError::PayloadTooLarge { .. })
        ));
    }
}
