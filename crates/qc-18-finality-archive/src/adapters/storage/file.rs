//! File-backed key-value store.
//!
//! The whole table is kept in memory and rewritten to a snapshot file on every
//! write (temp file, `sync_all`, rename), so an acknowledged write survives a
//! crash. Suitable for development, tooling and light deployments.
//!
//! Snapshot format, repeated: `[ns:u8][key_len:u32][key][value_len:u32][value]`

use super::memory::scan;
use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore, Namespace, ScanResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

type Table = BTreeMap<(Namespace, Vec<u8>), Vec<u8>>;

pub struct FileBackedKVStore {
    data: RwLock<Table>,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Open the store at `path`, loading the snapshot if one exists.
    ///
    /// ## Errors
    ///
    /// - `IOError`: the file exists but cannot be read
    /// - `CorruptionError`: the snapshot is truncated or has an unknown namespace
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();

        let data = match std::fs::read(&path) {
            Ok(bytes) => {
                let data = decode_snapshot(&bytes)?;
                tracing::info!(
                    "[qc-18] 💾 Loaded {} keys from {} ({} bytes)",
                    data.len(),
                    path.display(),
                    bytes.len()
                );
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("[qc-18] 📁 No existing archive file at {}", path.display());
                Table::new()
            }
            Err(e) => {
                return Err(KVStoreError::IOError {
                    message: format!("failed to read {}: {}", path.display(), e),
                })
            }
        };

        Ok(Self {
            data: RwLock::new(data),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_to_file(&self, data: &Table) -> Result<(), KVStoreError> {
        let io_err = |e: std::io::Error| KVStoreError::IOError {
            message: e.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let bytes = encode_snapshot(data);

        // Write atomically via temp file
        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(io_err)?;
        file.write_all(&bytes).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_err)?;

        Ok(())
    }

    /// Apply `ops` and persist. On a failed save the in-memory table is rolled back.
    fn apply(&self, ops: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut data = self.data.write();
        let mut undo = Vec::with_capacity(ops.len());

        for op in ops {
            match op {
                BatchOperation::Put { ns, key, value } => {
                    let previous = data.insert((ns, key.clone()), value);
                    undo.push(((ns, key), previous));
                }
            }
        }

        if let Err(e) = self.save_to_file(&data) {
            for (slot, previous) in undo.into_iter().rev() {
                match previous {
                    Some(value) => {
                        data.insert(slot, value);
                    }
                    None => {
                        data.remove(&slot);
                    }
                }
            }
            return Err(e);
        }
        Ok(())
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, ns: Namespace, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.read().get(&(ns, key.to_vec())).cloned())
    }

    fn put(&self, ns: Namespace, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.apply(vec![BatchOperation::put(ns, key, value)])
    }

    fn atomic_batch_write(&self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        self.apply(operations)
    }

    fn iterate(&self, ns: Namespace, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        Ok(scan(&self.data.read(), ns, prefix))
    }
}

// =============================================================================
// SNAPSHOT ENCODING
// =============================================================================

fn ns_tag(ns: Namespace) -> u8 {
    match ns {
        Namespace::FinalityArchive => 0,
        Namespace::FinalityIndex => 1,
        Namespace::FinalityCheckpoints => 2,
    }
}

fn ns_from_tag(tag: u8) -> Option<Namespace> {
    match tag {
        0 => Some(Namespace::FinalityArchive),
        1 => Some(Namespace::FinalityIndex),
        2 => Some(Namespace::FinalityCheckpoints),
        _ => None,
    }
}

fn encode_snapshot(data: &Table) -> Vec<u8> {
    let mut bytes = Vec::new();
    for ((ns, key), value) in data {
        bytes.push(ns_tag(*ns));
        bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
        bytes.extend_from_slice(key);
        bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
        bytes.extend_from_slice(value);
    }
    bytes
}

fn decode_snapshot(bytes: &[u8]) -> Result<Table, KVStoreError> {
    let mut data = Table::new();
    let mut cursor = 0;

    while cursor < bytes.len() {
        let tag = bytes[cursor];
        cursor += 1;
        let ns = ns_from_tag(tag).ok_or_else(|| KVStoreError::CorruptionError {
            message: format!("unknown namespace tag {} at offset {}", tag, cursor - 1),
        })?;
        let key = read_chunk(bytes, &mut cursor)?;
        let value = read_chunk(bytes, &mut cursor)?;
        data.insert((ns, key), value);
    }

    Ok(data)
}

fn read_chunk(bytes: &[u8], cursor: &mut usize) -> Result<Vec<u8>, KVStoreError> {
    let start = *cursor;
    let truncated = || KVStoreError::CorruptionError {
        message: format!("snapshot truncated at offset {}", start),
    };

    let len_end = start.checked_add(4).ok_or_else(truncated)?;
    let len_bytes: [u8; 4] = bytes
        .get(start..len_end)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(truncated)?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    let end = len_end.checked_add(len).ok_or_else(truncated)?;
    let chunk = bytes.get(len_end..end).ok_or_else(truncated)?.to_vec();
    *cursor = end;
    Ok(chunk)
}
