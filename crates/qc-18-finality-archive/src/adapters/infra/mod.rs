//! Infrastructure Adapters
//!
//! Implementations of infrastructure traits (content hashing).

mod hasher;

pub use hasher::Sha256ContentHasher;
