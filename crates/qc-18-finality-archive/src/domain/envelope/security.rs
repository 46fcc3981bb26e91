//! # Envelope Security
//!
//! Framing constants and overhead limits.
//!
//! ## Security Invariants
//!
//! - `length == len(uncompressed payload)`
//! - `checksum == hash(uncompressed payload)`
//! - Header never grows past the 96-byte overhead budget without a version field

use crate::domain::compression::Transform;

/// Size of the little-endian payload length field.
pub const LENGTH_FIELD_SIZE: usize = 8;

/// Size of the content checksum field.
pub const CHECKSUM_FIELD_SIZE: usize = 32;

/// Concrete header size (length + checksum).
pub const ENVELOPE_HEADER_SIZE: usize = LENGTH_FIELD_SIZE + CHECKSUM_FIELD_SIZE;

/// Maximum permitted framing overhead. Bytes above the header are reserved slack.
pub const ENVELOPE_OVERHEAD_BUDGET: usize = 96;

const _: () = assert!(ENVELOPE_HEADER_SIZE <= ENVELOPE_OVERHEAD_BUDGET);

/// Reserved, unconsumed part of the overhead budget.
pub const fn reserved_slack() -> usize {
    ENVELOPE_OVERHEAD_BUDGET - ENVELOPE_HEADER_SIZE
}

/// Largest envelope the codec can emit for a payload of `payload_len` bytes.
pub fn max_envelope_len(payload_len: usize, transform: Transform) -> usize {
    ENVELOPE_HEADER_SIZE + transform.worst_case_len(payload_len)
}
