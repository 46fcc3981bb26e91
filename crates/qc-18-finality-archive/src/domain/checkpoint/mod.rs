//! # Checkpoint Manifests
//!
//! Immutable records summarizing a fully archived segment range plus a
//! state-root commitment. Used as replay and recovery entry points.
//!
//! ## Module Structure
//!
//! - `manifest` - CheckpointId, SegmentRange, CheckpointManifest
//! - `arena` - CheckpointArena (append-only chain indexed by checkpoint id)
//!
//! ## Chain Layout
//!
//! ```text
//! #1 ──prev_hash──→ #2 ──prev_hash──→ #3 ...
//! ```
//!
//! Manifests are never mutated. A newer manifest supersedes, it does not remove.

mod arena;
mod manifest;


// Re-export public API
pub use arena::CheckpointArena;
pub use manifest::{compute_segments_root, CheckpointId, CheckpointManifest, SegmentRange};
