//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the Finality Archive service. The host
//! application supplies a shared, thread-safe key-value store and a
//! content hash function.

use crate::domain::errors::{Hash, KVStoreError};

pub use crate::domain::types::Namespace;

/// Result of a prefix scan: `(key, value)` pairs in ascending key order.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Abstract interface for namespaced key-value operations.
///
/// All methods take `&self`: implementations synchronize internally so one
/// store can serve concurrent archive and retrieve calls.
///
/// Production: `RocksDbStore` (feature `rocksdb`), `FileBackedKVStore`
/// Testing: `InMemoryKVStore`
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Put a single key-value pair. Durable once this returns `Ok`.
    fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;

    /// Execute an atomic batch write.
    ///
    /// ## Atomicity
    ///
    /// Either ALL operations in the batch are applied, or NONE are.
    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// Iterate over keys with a prefix, ascending.
    fn iterate(&self, ns: Namespace, prefix: &[u8]) -> Result<ScanResult, KVStoreError>;
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put {
        ns: Namespace,
        key: Vec<u8>,
        value: Vec<u8>,
    },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(ns: Namespace, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            ns,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Abstract interface for content hashing.
///
/// Must be deterministic and collision-resistant.
pub trait ContentHasher: Send + Sync {
    /// Compute the 32-byte digest of `data`.
    fn hash(&self, data: &[u8]) -> Hash;
}

impl<T: ContentHasher + ?Sized> ContentHasher for std::sync::Arc<T> {
    fn hash(&self, data: &[u8]) -> Hash {
        (**self).hash(data)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        (**self).get(ns, key)
    }

    fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        (**self).put(ns, key, value)
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        (**self).atomic_batch_write(operations)
    }

    fn iterate(&self, ns: Namespace, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        (**self).iterate(ns, prefix)
    }
}
