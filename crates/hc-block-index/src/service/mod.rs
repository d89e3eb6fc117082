//! # Block Index Service
//!
//! `BlockIndexStore` implements [`BlockIndexApi`] over any [`KeyValueStore`].
//!
//! ## Write Path
//!
//! Level, header and metadata writes are staged in memory and reach the
//! key-value store in one atomic batch on `flush`, followed by `commit`.
//! Reads see staged writes. A crash before `flush` leaves the last flushed
//! state, which `index_integrity_check` validates on the next start;
//! `discard_pending` returns to it without a restart.
//!
//! State sits behind one `parking_lot::RwLock`: lookups share it, staging,
//! flushing and the integrity check take it exclusively.

use crate::domain::codec::{
    decode_hash, decode_level, decode_u64, encode_level, encode_u64, header_key, level_key,
    open_header_record, parse_level_key, seal_header_record, BEST_KEY, SIZE_KEY,
};
use crate::domain::entities::{BlockInfo, IntegrityCheckResult, IntegrityReport};
use crate::domain::errors::IndexError;
use crate::domain::integrity::{check_integrity, HeaderLink, LevelSource};
use crate::ports::inbound::BlockIndexApi;
use crate::ports::outbound::{BatchOperation, HeaderSerializer, KeyValueStore};
use crate::adapters::{BincodeHeaderSerializer, InMemoryKVStore};
use parking_lot::RwLock;
use shared_types::{BlockHeader, Hash};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, error, info, warn};


/// Mutable state guarded by the store lock.
struct IndexState<KV: KeyValueStore> {
    kv: KV,
    pending_levels: BTreeMap<u64, Vec<BlockInfo>>,
    /// Sealed header records keyed by hash.
    pending_headers: HashMap<Hash, Vec<u8>>,
    /// Levels including staged ones.
    size: u64,
    best: Option<Hash>,
    best_dirty: bool,
    size_dirty: bool,
    /// Size and best hash as of the last flush.
    flushed_size: u64,
    flushed_best: Option<Hash>,
}

impl<KV: KeyValueStore> IndexState<KV> {
    fn new(kv: KV, size: u64, best: Option<Hash>) -> Self {
        Self {
            kv,
            pending_levels: BTreeMap::new(),
            pending_headers: HashMap::new(),
            size,
            best,
            best_dirty: false,
            size_dirty: false,
            flushed_size: size,
            flushed_best: best,
        }
    }

    fn has_pending(&self) -> bool {
        !self.pending_levels.is_empty()
            || !self.pending_headers.is_empty()
            || self.best_dirty
            || self.size_dirty
    }

    fn discard(&mut self) {
        self.pending_levels.clear();
        self.pending_headers.clear();
        self.size = self.flushed_size;
        self.best = self.flushed_best;
        self.size_dirty = false;
        self.best_dirty = false;
    }

    fn level(&self, level: u64) -> Result<Option<Vec<BlockInfo>>, IndexError> {
        if let Some(infos) = self.pending_levels.get(&level) {
            return Ok(Some(infos.clone()));
        }
        match self.kv.get(&level_key(level))? {
            Some(bytes) => Ok(Some(decode_level(&bytes)?)),
            None => Ok(None),
        }
    }

    fn header<HS: HeaderSerializer>(
        &self,
        hash: &Hash,
        serializer: &HS,
    ) -> Result<Option<BlockHeader>, IndexError> {
        let record = match self.pending_headers.get(hash) {
            Some(record) => record.clone(),
            None => match self.kv.get(&header_key(hash))? {
                Some(record) => record,
                None => return Ok(None),
            },
        };

        let (expected, actual, payload) = open_header_record(&record)?;
        if expected != actual {
            return Err(IndexError::HeaderCorrupted {
                hash: *hash,
                expected,
                actual,
            });
        }
        Ok(Some(serializer.deserialize(payload)?))
    }

    fn flush(&mut self) -> Result<(), IndexError> {
        let mut batch = Vec::with_capacity(self.pending_levels.len() + self.pending_headers.len() + 2);

        for (level, infos) in &self.pending_levels {
            batch.push(BatchOperation::put(level_key(*level), encode_level(infos)));
        }
        for (hash, record) in &self.pending_headers {
            batch.push(BatchOperation::put(header_key(hash), record.clone()));
        }
        if self.size_dirty {
            batch.push(BatchOperation::put(SIZE_KEY.to_vec(), encode_u64(self.size)));
        }
        if self.best_dirty {
            if let Some(best) = self.best {
                batch.push(BatchOperation::put(BEST_KEY.to_vec(), best.to_vec()));
            }
        }

        if batch.is_empty() {
            return Ok(());
        }

        let levels = self.pending_levels.len();
        let headers = self.pending_headers.len();
        self.kv.atomic_batch_write(batch)?;
        self.kv.commit()?;

        self.pending_levels.clear();
        self.pending_headers.clear();
        self.size_dirty = false;
        self.best_dirty = false;
        self.flushed_size = self.size;
        self.flushed_best = self.best;

        debug!(
            "[hc-index] Flushed {} levels and {} headers (size {})",
            levels, headers, self.size
        );
        Ok(())
    }
}

/// Read view handed to the integrity scan.
struct IntegrityView<'a, KV: KeyValueStore, HS: HeaderSerializer> {
    state: &'a IndexState<KV>,
    serializer: &'a HS,
}

impl<KV: KeyValueStore, HS: HeaderSerializer> LevelSource for IntegrityView<'_, KV, HS> {
    fn level(&self, number: u64) -> Result<Option<Vec<BlockInfo>>, IndexError> {
        self.state.level(number)
    }

    fn header_link(&self, hash: &Hash) -> Result<Option<HeaderLink>, IndexError> {
        // An unreadable header cannot be linked; the scan reports it as missing.
        match self.state.header(hash, self.serializer) {
            Ok(header) => Ok(header.map(|h| HeaderLink {
                parent_hash: h.parent_hash(),
                difficulty: h.difficulty(),
            })),
            Err(e @ (IndexError::HeaderCorrupted { .. } | IndexError::Serialization(_))) => {
                warn!("[hc-index] Unreadable header during integrity check: {}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// Persistent level index.
pub struct BlockIndexStore<KV: KeyValueStore, HS: HeaderSerializer> {
    inner: RwLock<IndexState<KV>>,
    serializer: HS,
    #[cfg(feature = "locking")]
    _lock: Option<crate::adapters::DatabaseLock>,
}

impl<KV: KeyValueStore, HS: HeaderSerializer> BlockIndexStore<KV, HS> {
    /// Open a store over `kv`, resuming from its last flushed state.
    ///
    /// The level count comes from the size record, or from the highest level
    /// key when that record is absent.
    pub fn open(kv: KV, serializer: HS) -> Result<Self, IndexError> {
        let size = match kv.get(SIZE_KEY)? {
            Some(bytes) => decode_u64(&bytes)?,
            None => kv
                .keys()?
                .filter_map(|key| parse_level_key(&key))
                .max()
                .map(|level| level + 1)
                .unwrap_or(0),
        };
        let best = match kv.get(BEST_KEY)? {
            Some(bytes) => Some(decode_hash(&bytes)?),
            None => None,
        };

        info!("[hc-index] Opened block index with {} levels", size);

        Ok(Self {
            inner: RwLock::new(IndexState::new(kv, size, best)),
            serializer,
            #[cfg(feature = "locking")]
            _lock: None,
        })
    }

    /// Give back the key-value store, dropping staged writes.
    pub fn into_inner(self) -> KV {
        self.inner.into_inner().kv
    }

    /// Whether writes are staged but not flushed.
    pub fn has_pending(&self) -> bool {
        self.inner.read().has_pending()
    }
}

impl BlockIndexStore<InMemoryKVStore, BincodeHeaderSerializer> {
    /// Empty in-memory store.
    pub fn new_in_memory() -> Self {
        Self {
            inner: RwLock::new(IndexState::new(InMemoryKVStore::new(), 0, None)),
            serializer: BincodeHeaderSerializer,
            #[cfg(feature = "locking")]
            _lock: None,
        }
    }
}

#[cfg(feature = "locking")]
impl BlockIndexStore<crate::adapters::FileBackedKVStore, BincodeHeaderSerializer> {
    /// File name of the index inside its directory.
    pub const INDEX_FILE: &'static str = "index.db";

    /// Open the index in `dir`, holding the directory lock for the store's
    /// lifetime.
    pub fn open_dir(dir: &std::path::Path) -> Result<Self, IndexError> {
        let lock = crate::adapters::DatabaseLock::acquire(dir)
            .map_err(|e| IndexError::Locked(e.to_string()))?;
        let kv = crate::adapters::FileBackedKVStore::open(dir.join(Self::INDEX_FILE))?;
        let mut store = Self::open(kv, BincodeHeaderSerializer)?;
        store._lock = Some(lock);
        Ok(store)
    }
}

impl<KV: KeyValueStore, HS: HeaderSerializer> BlockIndexApi for BlockIndexStore<KV, HS> {
    fn get_block_infos_at_level(&self, level: u64) -> Result<Vec<BlockInfo>, IndexError> {
        let state = self.inner.read();
        Ok(state.level(level)?.unwrap_or_default())
    }

    fn put_block_infos_at_level(&self, level: u64, infos: Vec<BlockInfo>) -> Result<(), IndexError> {
        if infos.is_empty() {
            return Err(IndexError::EmptyLevel { level });
        }
        let mut seen = HashSet::with_capacity(infos.len());
        for info in &infos {
            if !seen.insert(info.hash) {
                return Err(IndexError::DuplicateInfo {
                    level,
                    hash: info.hash,
                });
            }
        }
        if level == 0 && (infos.len() != 1 || !infos[0].is_main_chain) {
            return Err(IndexError::InvalidGenesisLevel { count: infos.len() });
        }

        let mut state = self.inner.write();
        if level > state.size {
            return Err(IndexError::LevelGap {
                level,
                size: state.size,
            });
        }
        if level == state.size {
            state.size += 1;
            state.size_dirty = true;
        }
        state.pending_levels.insert(level, infos);
        Ok(())
    }

    fn index_integrity_check_with_report(
        &self,
    ) -> Result<(IntegrityCheckResult, IntegrityReport), IndexError> {
        let mut state = self.inner.write();

        let outcome = {
            let view = IntegrityView {
                state: &*state,
                serializer: &self.serializer,
            };
            check_integrity(&view, state.size, state.best)?
        };

        match outcome.result {
            IntegrityCheckResult::Correct => {
                info!(
                    "[hc-index] Integrity check CORRECT ({} levels)",
                    outcome.report.levels_scanned
                );
            }
            IntegrityCheckResult::Fixed => {
                for (level, infos) in outcome.repaired {
                    state.pending_levels.insert(level, infos);
                }
                if outcome.head.is_some() && outcome.head != state.best {
                    state.best = outcome.head;
                    state.best_dirty = true;
                }
                state.flush()?;
                warn!(
                    "[hc-index] Integrity check FIXED: {} difficulties and {} flags repaired",
                    outcome.report.difficulties_repaired, outcome.report.flags_repaired
                );
            }
            IntegrityCheckResult::MissingGenesis | IntegrityCheckResult::MissingLevel => {
                error!(
                    "[hc-index] Integrity check {}: index cannot be recovered (level {:?})",
                    outcome.result, outcome.report.failed_level
                );
            }
        }

        Ok((outcome.result, outcome.report))
    }

    fn flush(&self) -> Result<(), IndexError> {
        self.inner.write().flush()
    }

    fn discard_pending(&self) {
        let mut state = self.inner.write();
        if state.has_pending() {
            debug!(
                "[hc-index] Discarding {} staged levels and {} headers",
                state.pending_levels.len(),
                state.pending_headers.len()
            );
            state.discard();
        }
    }

    fn get_header(&self, hash: &Hash) -> Result<Option<BlockHeader>, IndexError> {
        self.inner.read().header(hash, &self.serializer)
    }

    fn put_header(&self, header: &BlockHeader) -> Result<(), IndexError> {
        let record = seal_header_record(&self.serializer.serialize(header)?);
        self.inner
            .write()
            .pending_headers
            .insert(header.hash(), record);
        Ok(())
    }

    fn best_block_hash(&self) -> Result<Option<Hash>, IndexError> {
        Ok(self.inner.read().best)
    }

    fn set_best_block_hash(&self, hash: Hash) -> Result<(), IndexError> {
        let mut state = self.inner.write();
        state.best = Some(hash);
        state.best_dirty = true;
        Ok(())
    }

    fn level_count(&self) -> u64 {
        self.inner.read().size
    }

    fn initialize_genesis(&self, genesis: &BlockHeader) -> Result<(), IndexError> {
        if !genesis.is_genesis() {
            return Err(IndexError::NotGenesis {
                number: genesis.number(),
            });
        }
        let record = seal_header_record(&self.serializer.serialize(genesis)?);

        let mut state = self.inner.write();
        if let Some(existing) = state.level(0)?.and_then(|infos| infos.first().map(|i| i.hash)) {
            return Err(IndexError::AlreadyInitialized(existing));
        }

        let hash = genesis.hash();
        state.pending_headers.insert(hash, record);
        state
            .pending_levels
            .insert(0, vec![BlockInfo::new(hash, genesis.difficulty(), true)]);
        state.size = state.size.max(1);
        state.size_dirty = true;
        state.best = Some(hash);
        state.best_dirty = true;
        if let Err(e) = state.flush() {
            state.discard();
            return Err(e);
        }

        info!("[hc-index] Initialised genesis {:02x?}", &hash[..4]);
        Ok(())
    }
}
