//! # Index Tests

use super::*;
use crate::domain::compression::Transform;
use crate::domain::errors::ArchiveError;

fn location(segment_id: u64, tag: u8) -> SegmentLocation {
    SegmentLocation {
        segment_id,
        key: segment_id.to_be_bytes().to_vec(),
        envelope_len: 64,
        checksum: [tag; 32],
        envelope_digest: [tag.wrapping_add(1); 32],
        transform: Transform::Codec { level: 3 },
    }
}

#[test]
fn test_record_and_locate() {
    let mut index = FinalityIndex::new();
    assert!(index.record(5, location(5, 1)).unwrap());

    assert_eq!(index.locate(5), Some(&location(5, 1)));
    assert!(index.locate(6).is_none());
    assert_eq!(index.len(), 1);
}

#[test]
fn test_record_is_idempotent_for_same_location() {
    let mut index = FinalityIndex::new();
    assert!(index.record(5, location(5, 1)).unwrap());
    assert!(!index.record(5, location(5, 1)).unwrap());
    assert_eq!(index.len(), 1);
}

#[test]
fn test_record_conflict_detected() {
    let mut index = FinalityIndex::new();
    index.record(5, location(5, 1)).unwrap();

    let result = index.record(5, location(5, 2));
    assert!(matches!(
        result,
        Err(ArchiveError::IndexConflict { segment_id: 5 })
    ));
    // Original entry untouched
    assert_eq!(index.locate(5), Some(&location(5, 1)));
}

#[test]
fn test_water_marks() {
    let mut index = FinalityIndex::new();
    assert_eq!(index.high_water(), None);

    for id in [3, 9, 4] {
        index.record(id, location(id, id as u8)).unwrap();
    }
    assert_eq!(index.low_water(), Some(3));
    assert_eq!(index.high_water(), Some(9));
}

#[test]
fn test_missing_in_range() {
    let mut index = FinalityIndex::new();
    for id in [1, 2, 4, 7] {
        index.record(id, location(id, 0)).unwrap();
    }

    assert_eq!(index.missing_in(1..=7), vec![3, 5, 6]);
    assert_eq!(index.missing_in(1..=2), Vec::<u64>::new());
    assert_eq!(index.missing_in(6..=9), vec![6, 8, 9]);
    assert_eq!(index.missing_in(10..=12), vec![10, 11, 12]);
    assert!(index.missing_in(5..=1).is_empty());
}

#[test]
fn test_missing_in_is_capped() {
    let index = FinalityIndex::new();
    let missing = index.missing_in(0..=10_000);
    assert_eq!(missing.len(), finality_index_cap());
    assert_eq!(missing[0], 0);
}

#[test]
fn test_missing_in_handles_u64_max() {
    let mut index = FinalityIndex::new();
    index.record(u64::MAX, location(u64::MAX, 0)).unwrap();
    assert!(index.missing_in(u64::MAX..=u64::MAX).is_empty());
    assert_eq!(index.missing_in(u64::MAX - 1..=u64::MAX), vec![u64::MAX - 1]);
}

#[test]
fn test_inverted_range_is_empty() {
    let mut index = FinalityIndex::new();
    index.record(2, location(2, 0)).unwrap();
    assert_eq!(index.range(3..=1).count(), 0);
    assert_eq!(index.range(1..=3).count(), 1);
}

fn finality_index_cap() -> usize {
    super::finality_index::MAX_REPORTED_MISSING
}
