use crate::domain::errors::KVStoreError;
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Single-file key-value store.
///
/// Mutations are held in memory and written out on `commit` via a temp file
/// and rename, so a crash leaves either the previous or the new file.
pub struct FileBackedKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
    dirty: bool,
}

fn io_error(e: std::io::Error) -> KVStoreError {
    KVStoreError::IOError {
        message: e.to_string(),
    }
}

impl FileBackedKVStore {
    /// Open the store at `path`, loading any committed content.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();

        let data = match std::fs::read(&path) {
            Ok(bytes) => {
                let data = Self::decode(&bytes);
                info!(
                    "[hc-index] Loaded {} keys from {} ({} bytes)",
                    data.len(),
                    path.display(),
                    bytes.len()
                );
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[hc-index] No existing index file at {}", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(io_error(e)),
        };

        Ok(Self {
            data,
            path,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Layout: [key_len:u32 LE][key][value_len:u32 LE][value]...
    fn decode(bytes: &[u8]) -> BTreeMap<Vec<u8>, Vec<u8>> {
        let mut data = BTreeMap::new();
        let mut cursor = 0;

        let read_len = |cursor: usize| -> Option<usize> {
            let raw: [u8; 4] = bytes.get(cursor..cursor + 4)?.try_into().ok()?;
            Some(u32::from_le_bytes(raw) as usize)
        };

        while cursor < bytes.len() {
            let Some(key_len) = read_len(cursor) else { break };
            let key_start = cursor + 4;
            let Some(key) = bytes.get(key_start..key_start + key_len) else { break };
            let Some(value_len) = read_len(key_start + key_len) else { break };
            let value_start = key_start + key_len + 4;
            let Some(value) = bytes.get(value_start..value_start + value_len) else { break };

            data.insert(key.to_vec(), value.to_vec());
            cursor = value_start + value_len;
        }

        if cursor < bytes.len() {
            warn!(
                "[hc-index] Ignoring {} trailing bytes in index file",
                bytes.len() - cursor
            );
        }

        data
    }

    fn save_to_file(&self) -> Result<(), KVStoreError> {
        use std::io::Write;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let mut bytes = Vec::new();
        for (key, value) in &self.data {
            bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
            bytes.extend_from_slice(key);
            bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
            bytes.extend_from_slice(value);
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(io_error)?;
        file.write_all(&bytes).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;
        std::fs::rename(&temp_path, &self.path).map_err(io_error)?;

        debug!(
            "[hc-index] Committed {} keys to {}",
            self.data.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.data.insert(key.to_vec(), value.to_vec());
        self.dirty = true;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.dirty |= self.data.remove(key).is_some();
        Ok(())
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        for op in operations {
            match op {
                BatchOperation::Put { key, value } => {
                    self.data.insert(key, value);
                }
                BatchOperation::Delete { key } => {
                    self.data.remove(&key);
                }
            }
        }
        self.dirty = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), KVStoreError> {
        if !self.dirty {
            return Ok(());
        }
        self.save_to_file()?;
        self.dirty = false;
        Ok(())
    }

    fn keys(&self) -> Result<Box<dyn Iterator<Item = Vec<u8>> + '_>, KVStoreError> {
        Ok(Box::new(self.data.keys().cloned()))
    }
}
