//! # Finality Index
//!
//! Mapping from logical segment ids to physical archive locations.
//!
//! ## Module Structure
//!
//! - `location` - SegmentLocation (index entry value)
//! - `finality_index` - FinalityIndex (ordered id → location map)

mod finality_index;
mod location;

#[cfg(test)]
mod tests;

// Re-export public API
pub use finality_index::FinalityIndex;
pub use location::SegmentLocation;
