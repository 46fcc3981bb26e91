use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, Namespace, ScanResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;

type Table = BTreeMap<(Namespace, Vec<u8>), Vec<u8>>;

/// In-memory ordered key-value store.
///
/// A single write lock makes every batch atomic with respect to readers.
#[derive(Debug, Default)]
pub struct InMemoryKVStore {
    data: RwLock<Table>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys in `ns`.
    pub fn len(&self, ns: Namespace) -> usize {
        self.data.read().keys().filter(|(n, _)| *n == ns).count()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

pub(super) fn scan(data: &Table, ns: Namespace, prefix: &[u8]) -> ScanResult {
    data.range((ns, prefix.to_vec())..)
        .take_while(|((n, k), _)| *n == ns && k.starts_with(prefix))
        .map(|((_, k), v)| (k.clone(), v.clone()))
        .collect()
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.read().get(&(ns, key.to_vec())).cloned())
    }

    fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.data.write().insert((ns, key.to_vec()), value.to_vec());
        Ok(())
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut data = self.data.write();
        for op in operations {
            match op {
                BatchOperation::Put { ns, key, value } => {
                    data.insert((ns, key), value);
                }
            }
        }
        Ok(())
    }

    fn iterate(&self, ns: Namespace, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        Ok(scan(&self.data.read(), ns, prefix))
    }
}
