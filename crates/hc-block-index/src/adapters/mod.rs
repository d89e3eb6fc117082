//! # Adapters Module
//!
//! Implementations of the outbound ports.
//!
//! ## Modules
//!
//! - `storage`: in-memory and file-backed key-value stores
//! - `serializer`: bincode header codec
//! - `lock`: database process locking (singleton guard)

#[cfg(feature = "locking")]
pub mod lock;
pub mod serializer;
pub mod storage;

#[cfg(feature = "locking")]
pub use lock::{DatabaseLock, LockError};
pub use serializer::BincodeHeaderSerializer;
pub use storage::{FileBackedKVStore, InMemoryKVStore};
