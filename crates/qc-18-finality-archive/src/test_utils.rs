//! Test fixtures: a fault-injecting store and deterministic payloads.
//!
//! Requires feature: `test-utils` (always available to unit tests).

use crate::adapters::storage::InMemoryKVStore;
use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, Namespace, ScanResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory store whose writes and reads can be made to fail on demand.
#[derive(Debug, Default)]
pub struct FaultyKVStore {
    inner: InMemoryKVStore,
    fail_writes: AtomicBool,
    fail_index_puts: AtomicBool,
    fail_reads: AtomicBool,
    writes: AtomicUsize,
}

impl FaultyKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `put` and `atomic_batch_write`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Fail single puts into `finality_index` only (a crash between ordered writes).
    pub fn fail_index_puts(&self, fail: bool) {
        self.fail_index_puts.store(fail, Ordering::SeqCst);
    }

    /// Fail every `get` and `iterate`.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Successful write calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Direct access for tampering with stored bytes.
    pub fn inner(&self) -> &InMemoryKVStore {
        &self.inner
    }

    fn injected(&self, op: &str) -> KVStoreError {
        KVStoreError::IOError {
            message: format!("injected {} failure", op),
        }
    }

    fn read_guard(&self) -> Result<(), KVStoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(self.injected("read"));
        }
        Ok(())
    }
}

impl KeyValueStore for FaultyKVStore {
    fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.read_guard()?;
        self.inner.get(ns, key)
    }

    fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        if self.fail_writes.load(Ordering::SeqCst)
            || (ns == Namespace::FinalityIndex && self.fail_index_puts.load(Ordering::SeqCst))
        {
            return Err(self.injected("put"));
        }
        self.inner.put(ns, key, value)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(self.injected("batch"));
        }
        self.inner.atomic_batch_write(operations)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn iterate(&self, ns: Namespace, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        self.read_guard()?;
        self.inner.iterate(ns, prefix)
    }
}

/// Deterministic, moderately compressible payload for segment `id`.
pub fn make_segment_payload(id: u64, len: usize) -> Vec<u8> {
    let seed = format!("finalized-segment-{}:", id);
    seed.bytes().cycle().take(len.max(1)).collect()
}

/// Flip one bit of a stored value in place.
pub fn flip_stored_bit(store: &InMemoryKVStore, ns: Namespace, key: &[u8], byte: usize, bit: u8) {
    if let Ok(Some(mut value)) = store.get(ns, key) {
        if value.is_empty() {
            return;
        }
        let index = byte % value.len();
        value[index] ^= 1 << (bit % 8);
        let _ = store.put(ns, key, &value);
    }
}
