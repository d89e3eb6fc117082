//! # Block Index (hc-block-index)
//!
//! Persistent mapping from block level to the competing blocks seen at that
//! level, with cumulative difficulty and main-chain bookkeeping.
//!
//! ## Domain Invariants
//!
//! | # | Invariant | Description |
//! |---|-----------|-------------|
//! | 1 | Genesis | Level 0 holds exactly one record and it is on the main chain |
//! | 2 | Cumulative difficulty | Own difficulty plus the parent's cumulative difficulty |
//! | 3 | Single main chain | One main-chain record per level, linked genesis to head |
//! | 4 | First seen | Record order within a level is insertion order and survives restart |
//! | 5 | Last good | Only flushed state survives a restart |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Entities, record codec, integrity scan
//! - `ports/` - `BlockIndexApi` (inbound), `KeyValueStore`/`HeaderSerializer` (outbound)
//! - `adapters/` - In-memory and file stores, bincode codec, directory lock
//! - `service/` - `BlockIndexStore`
//!
//! ## Usage
//!
//! ```ignore
//! use hc_block_index::{BlockIndexApi, BlockIndexStore, IntegrityCheckResult};
//!
//! let index = BlockIndexStore::new_in_memory();
//! index.initialize_genesis(&genesis)?;
//! assert_eq!(index.index_integrity_check()?, IntegrityCheckResult::Correct);
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{BincodeHeaderSerializer, FileBackedKVStore, InMemoryKVStore};
#[cfg(feature = "locking")]
pub use adapters::{DatabaseLock, LockError};
pub use domain::entities::{
    find_info, main_chain_info, BlockInfo, IntegrityCheckResult, IntegrityReport,
};
pub use domain::errors::{IndexError, KVStoreError, SerializationError};
pub use ports::inbound::BlockIndexApi;
pub use ports::outbound::{BatchOperation, HeaderSerializer, KeyValueStore};
pub use service::BlockIndexStore;
