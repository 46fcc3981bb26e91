//! # Adapters Module
//!
//! Concrete implementations of the outbound ports.
//!
//! ## Modules
//!
//! - `storage`: `KeyValueStore` backends (memory, file, RocksDB)
//! - `infra`: `ContentHasher` implementation

pub mod infra;
pub mod storage;
