//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the block index.
//!
//! These are the interfaces the host application implements to give the
//! index somewhere to live.

use crate::domain::errors::{KVStoreError, SerializationError};
use shared_types::BlockHeader;

/// Ordered, byte-keyed storage.
///
/// Writes become durable at `commit`. Implementations: `InMemoryKVStore`
/// for tests, `FileBackedKVStore` for a single-file on-disk store.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;

    /// Delete a key.
    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either all operations in the batch are applied, or none are.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// Durability boundary.
    fn commit(&mut self) -> Result<(), KVStoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// All keys in ascending byte order.
    fn keys(&self) -> Result<Box<dyn Iterator<Item = Vec<u8>> + '_>, KVStoreError>;
}

/// Batch operation for atomic writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation {
    /// Put a key-value pair.
    Put { key: Vec<u8>, value: Vec<u8> },
    /// Delete a key.
    Delete { key: Vec<u8> },
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create a Delete operation.
    pub fn delete(key: impl Into<Vec<u8>>) -> Self {
        BatchOperation::Delete { key: key.into() }
    }
}

/// Header encoding used for `h:` records.
pub trait HeaderSerializer: Send + Sync {
    fn serialize(&self, header: &BlockHeader) -> Result<Vec<u8>, SerializationError>;

    /// Decoding re-runs header validation.
    fn deserialize(&self, data: &[u8]) -> Result<BlockHeader, SerializationError>;
}
