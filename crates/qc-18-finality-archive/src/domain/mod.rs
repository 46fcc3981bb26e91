//! # Domain Layer
//!
//! Pure archival logic with no I/O. Everything here is deterministic and
//! safe to call from any worker thread.
//!
//! ## Module Structure
//!
//! - `compression` - Bounded Zstd/identity transform
//! - `envelope` - `[length][checksum][body]` framing
//! - `index` - Segment id → location mapping
//! - `checkpoint` - Manifest chain
//! - `segment` - Segment id and write-path state machine
//! - `types` - Configuration and key layout
//! - `audit` - Verification scan report
//! - `errors` - Error taxonomy

pub mod audit;
pub mod checkpoint;
pub mod compression;
pub mod envelope;
pub mod errors;
pub mod index;
pub mod segment;
pub mod types;
