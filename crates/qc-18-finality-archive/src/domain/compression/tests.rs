//! # Compression Tests

use super::security::{validate_frame_header, MAX_LEVEL, MAX_PAYLOAD_SIZE, MIN_LEVEL};
use super::*;
use crate::domain::errors::ArchiveError;

fn sample_payload() -> Vec<u8> {
    b"finalized ledger segment: height=42 state_root=0xbb.. ".repeat(40)
}

#[test]
fn test_zstd_compress_decompress_roundtrip() {
    let manager = CompressionManager::default();
    let params = CompressionParams::new(3);

    let original = sample_payload();
    let compressed = manager.compress(&original, &params).expect("compress");
    let decompressed = manager
        .decompress(&compressed, original.len(), &params)
        .expect("decompress");

    assert_eq!(decompressed, original);
}

#[test]
fn test_compression_reduces_size() {
    let manager = CompressionManager::default();
    let original: Vec<u8> = (0..4096).map(|i| (i % 16) as u8).collect();

    let compressed = manager
        .compress(&original, &CompressionParams::new(1))
        .expect("compress");

    assert!(compressed.len() < original.len());
}

#[test]
fn test_level_bounds_are_inclusive() {
    let manager = CompressionManager::default();
    let payload = sample_payload();

    assert!(manager
        .compress(&payload, &CompressionParams::new(MIN_LEVEL))
        .is_ok());
    assert!(manager
        .compress(&payload, &CompressionParams::new(MAX_LEVEL))
        .is_ok());
    assert!(matches!(
        manager.compress(&payload, &CompressionParams::new(0)),
        Err(ArchiveError::InvalidLevel { level: 0, .. })
    ));
    assert!(matches!(
        manager.compress(&payload, &CompressionParams::new(22)),
        Err(ArchiveError::InvalidLevel { level: 22, .. })
    ));
}

#[test]
fn test_payload_ceiling_plus_one_rejected() {
    let manager = CompressionManager::default();
    let payload = vec![0u8; MAX_PAYLOAD_SIZE + 1];

    let result = manager.compress(&payload, &CompressionParams::new(1));
    assert!(matches!(
        result,
        Err(ArchiveError::PayloadTooLarge { size, max })
            if size == MAX_PAYLOAD_SIZE + 1 && max == MAX_PAYLOAD_SIZE
    ));
}

#[test]
fn test_payload_at_ceiling_accepted() {
    let manager = CompressionManager::default();
    let payload = vec![0u8; MAX_PAYLOAD_SIZE];

    let compressed = manager
        .compress(&payload, &CompressionParams::new(1))
        .expect("compress at ceiling");
    let restored = manager
        .decompress(&compressed, MAX_PAYLOAD_SIZE, &CompressionParams::new(1))
        .expect("decompress at ceiling");
    assert_eq!(restored.len(), MAX_PAYLOAD_SIZE);
}

#[test]
fn test_disabled_compression_passthrough() {
    let manager = CompressionManager::default();
    let params = CompressionParams::disabled();

    let original = b"Test data";
    let stored = manager.compress(original, &params).expect("compress");
    assert_eq!(stored, original);

    let restored = manager
        .decompress(&stored, original.len(), &params)
        .expect("decompress");
    assert_eq!(restored, original);
}

#[test]
fn test_disabled_mode_keeps_bounds() {
    let manager = CompressionManager::default();

    let too_big = vec![1u8; MAX_PAYLOAD_SIZE + 1];
    assert!(matches!(
        manager.compress(&too_big, &CompressionParams::disabled()),
        Err(ArchiveError::PayloadTooLarge { .. })
    ));

    let bad_level = CompressionParams {
        level: 0,
        enabled: false,
    };
    assert!(matches!(
        manager.compress(b"abc", &bad_level),
        Err(ArchiveError::InvalidLevel { .. })
    ));

    assert!(matches!(
        manager.decompress(b"abcd", 3, &CompressionParams::disabled()),
        Err(ArchiveError::SizeMismatch {
            expected: 3,
            actual: 4
        })
    ));
}

#[test]
fn test_decompress_rejects_garbage() {
    let manager = CompressionManager::default();
    let result = manager.decompress(b"definitely not zstd", 64, &CompressionParams::new(3));
    assert!(matches!(
        result,
        Err(ArchiveError::DecompressionFailed { .. })
    ));
}

#[test]
fn test_decompress_bounded_by_expected_len() {
    let manager = CompressionManager::default();
    let params = CompressionParams::new(3);

    // 1 MiB of zeros compresses to a few hundred bytes.
    let bomb = manager
        .compress(&vec![0u8; 1024 * 1024], &params)
        .expect("compress");

    let result = manager.decompress(&bomb, 1024, &params);
    assert!(matches!(
        result,
        Err(ArchiveError::DecompressionFailed { .. })
    ));
}

#[test]
fn test_decompress_rejects_declared_size_mismatch() {
    let manager = CompressionManager::default();
    let params = CompressionParams::new(3);
    let compressed = manager.compress(b"0123456789", &params).expect("compress");

    // The frame declares 10 bytes; asking for 20 fails before decoding.
    let result = manager.decompress(&compressed, 20, &params);
    assert!(matches!(
        result,
        Err(ArchiveError::DecompressionFailed { .. })
    ));
}

#[test]
fn test_frames_are_single_segment_at_every_level() {
    let manager = CompressionManager::default();
    let payload = vec![0x5Au8; 1024 * 1024];

    for level in [MIN_LEVEL, 3, 19, MAX_LEVEL] {
        let compressed = manager
            .compress(&payload, &CompressionParams::new(level))
            .expect("compress");
        assert_eq!(compressed[4] & 0x20, 0x20, "level {}", level);
        assert!(validate_frame_header(&compressed, payload.len()).is_ok());
    }
}

#[test]
fn test_lowered_ceiling_still_reads_larger_payloads() {
    let params = CompressionParams::new(3);
    let payload = sample_payload();
    let compressed = CompressionManager::default()
        .compress(&payload, &params)
        .expect("compress");

    let lowered = CompressionManager::new(256).expect("ceiling");
    assert!(matches!(
        lowered.compress(&payload, &params),
        Err(ArchiveError::PayloadTooLarge { max: 256, .. })
    ));
    assert_eq!(
        lowered
            .decompress(&compressed, payload.len(), &params)
            .expect("decompress"),
        payload
    );
}

#[test]
fn test_expected_len_above_hard_limit_rejected_before_decoding() {
    let manager = CompressionManager::new(1024).expect("ceiling");
    let result = manager.decompress(&[0u8; 8], MAX_PAYLOAD_SIZE + 1, &CompressionParams::new(3));
    assert!(matches!(result, Err(ArchiveError::PayloadTooLarge { .. })));
}

#[test]
fn test_ceiling_cannot_be_raised() {
    assert!(CompressionManager::new(MAX_PAYLOAD_SIZE).is_ok());
    assert!(matches!(
        CompressionManager::new(MAX_PAYLOAD_SIZE + 1),
        Err(ArchiveError::InvalidConfig { .. })
    ));
    assert!(CompressionManager::new(0).is_err());
}

#[test]
fn test_transform_selection() {
    assert_eq!(
        CompressionParams::new(5).transform().unwrap(),
        Transform::Codec { level: 5 }
    );
    assert_eq!(
        CompressionParams::disabled().transform().unwrap(),
        Transform::Identity
    );
    assert!(Transform::Codec { level: 1 }.worst_case_len(1000) >= 1000);
    assert_eq!(Transform::Identity.worst_case_len(1000), 1000);
}
