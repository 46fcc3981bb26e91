//! # Compression Module
//!
//! Bounded, stateless compression for archived segments.

mod manager;
pub mod security;

#[cfg(test)]
mod tests;

// Re-export public types
pub use manager::{CompressionManager, CompressionParams, Transform};
