//! Shared builders for scenarios and benchmarks.

use hc_block_index::{BincodeHeaderSerializer, BlockIndexStore, InMemoryKVStore};
use hc_consensus::adapters::{ExecutionGate, InMemoryExecutor};
use hc_consensus::{
    ChainConfig, ChainSelector, ChainSelectorDependencies, ForkActivation, ForkConfig,
};
use primitive_types::U256;
use shared_types::{Address, BlockHeader, Hash, HeaderFields, Seal, ZERO_HASH};
use std::sync::Arc;
use std::time::Duration;

pub type MemoryIndex = BlockIndexStore<InMemoryKVStore, BincodeHeaderSerializer>;
pub type MemorySelector = ChainSelector<MemoryIndex, InMemoryExecutor>;

pub const MINER: Address = [0xAA; 32];
pub const STAKER: Address = [0xBB; 32];
pub const ENERGY_LIMIT: u64 = 15_000_000;

/// Route `tracing` output to the test writer; `RUST_LOG` filters.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fields(number: u64, parent: Hash, timestamp: u64, difficulty: u64, tag: u8) -> HeaderFields {
    HeaderFields {
        number,
        parent_hash: parent,
        coinbase: MINER,
        timestamp,
        difficulty: U256::from(difficulty),
        energy_limit: ENERGY_LIMIT,
        energy_consumed: 0,
        extra_data: vec![tag],
        tx_trie_root: [0; 32],
        state_root: [0; 32],
        seal: Seal::Mining {
            nonce: [tag; 32],
            solution: vec![0xC0, 0xDE],
        },
    }
}

pub fn genesis() -> BlockHeader {
    BlockHeader::try_new(fields(0, ZERO_HASH, 1_600_000_000, 16, 0))
        .expect("genesis fixture is well-formed")
}

/// Mining header on `parent`, ten seconds later.
pub fn mining_child(parent: &BlockHeader, difficulty: u64, tag: u8) -> BlockHeader {
    mining_child_after(parent, 10, difficulty, tag)
}

pub fn mining_child_after(
    parent: &BlockHeader,
    seconds: u64,
    difficulty: u64,
    tag: u8,
) -> BlockHeader {
    BlockHeader::try_new(fields(
        parent.number() + 1,
        parent.hash(),
        parent.timestamp() + seconds,
        difficulty,
        tag,
    ))
    .expect("mining fixture is well-formed")
}

/// Staking header on `parent` with a `seed_len`-byte seed.
pub fn staking_child(parent: &BlockHeader, seed_len: usize, tag: u8) -> BlockHeader {
    let mut f = fields(
        parent.number() + 1,
        parent.hash(),
        parent.timestamp() + 10,
        16,
        tag,
    );
    f.coinbase = STAKER;
    f.seal = Seal::Staking {
        seed: vec![tag; seed_len],
        signature: vec![0x5A; 64],
        public_key: STAKER,
    };
    BlockHeader::try_new(f).expect("staking fixture is well-formed")
}

/// Hybrid at `hybrid`, signature swap three blocks later.
pub fn unity_config(hybrid: u64) -> ChainConfig {
    ChainConfig::default().with_fork(
        ForkConfig::default()
            .with_hybrid_fork(ForkActivation::new(hybrid))
            .with_signature_swap_fork(ForkActivation::new(hybrid + 3)),
    )
}

/// In-memory selector seeded with [`genesis`].
pub struct Node {
    pub selector: MemorySelector,
    pub index: Arc<MemoryIndex>,
    pub gate: Arc<ExecutionGate<InMemoryExecutor>>,
}

impl Node {
    pub fn new(config: ChainConfig, executor: InMemoryExecutor) -> Self {
        Self::with_timeout(config, executor, Duration::from_secs(5))
    }

    pub fn with_timeout(config: ChainConfig, executor: InMemoryExecutor, timeout: Duration) -> Self {
        let index = Arc::new(MemoryIndex::new_in_memory());
        let gate = Arc::new(ExecutionGate::with_timeout(executor, timeout));
        let selector = ChainSelector::with_genesis(
            ChainSelectorDependencies {
                index: Arc::clone(&index),
                gate: Arc::clone(&gate),
                config,
            },
            &genesis(),
        )
        .expect("fresh in-memory index accepts genesis");
        Self {
            selector,
            index,
            gate,
        }
    }
}
