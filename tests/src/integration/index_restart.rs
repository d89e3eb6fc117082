//! # Index Restart
//!
//! A file-backed index survives restarts with its head, first-seen tie order
//! and main-chain flags intact. Imports continue on the surviving executor,
//! and a corrupted cumulative difficulty is repaired when the selector
//! reopens the index.

#[cfg(test)]
mod tests {
    use crate::fixtures::{genesis, init_tracing, mining_child, unity_config};
    use hc_block_index::domain::codec::{decode_level, encode_level, level_key};
    use hc_block_index::{
        BincodeHeaderSerializer, BlockIndexApi, BlockIndexStore, FileBackedKVStore,
        IntegrityCheckResult, KeyValueStore,
    };
    use hc_consensus::adapters::{ExecutionGate, InMemoryExecutor};
    use hc_consensus::{
        ChainSelector, ChainSelectorApi, ChainSelectorDependencies, ConsensusError, ImportResult,
    };
    use primitive_types::U256;
    use shared_types::{Block, BlockHeader};
    use std::path::Path;
    use std::sync::Arc;

    type DiskIndex = BlockIndexStore<FileBackedKVStore, BincodeHeaderSerializer>;
    type DiskSelector = ChainSelector<DiskIndex, InMemoryExecutor>;

    fn deps(dir: &Path) -> ChainSelectorDependencies<DiskIndex, InMemoryExecutor> {
        deps_with(dir, Arc::new(ExecutionGate::new(InMemoryExecutor::new())))
    }

    fn deps_with(
        dir: &Path,
        gate: Arc<ExecutionGate<InMemoryExecutor>>,
    ) -> ChainSelectorDependencies<DiskIndex, InMemoryExecutor> {
        ChainSelectorDependencies {
            index: Arc::new(BlockIndexStore::open_dir(dir).unwrap()),
            gate,
            config: unity_config(100),
        }
    }

    fn import(selector: &DiskSelector, header: &BlockHeader) -> ImportResult {
        selector
            .try_connect(&Block::new(header.clone(), Vec::new()))
            .unwrap()
            .result
    }

    #[test]
    fn test_head_and_tie_order_survive_restart() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();

        let a1 = mining_child(&genesis(), 16, 1);
        let b1 = mining_child(&genesis(), 16, 2);
        let a2 = mining_child(&a1, 16, 3);
        let gate = Arc::new(ExecutionGate::new(InMemoryExecutor::new()));
        {
            let selector =
                DiskSelector::with_genesis(deps_with(dir.path(), Arc::clone(&gate)), &genesis())
                    .unwrap();
            assert_eq!(import(&selector, &a1), ImportResult::ImportedBest);
            assert_eq!(import(&selector, &b1), ImportResult::ImportedNotBest);
            assert_eq!(import(&selector, &a2), ImportResult::ImportedBest);
        }

        let selector = DiskSelector::open(deps_with(dir.path(), Arc::clone(&gate))).unwrap();
        let head = selector.best_block();
        assert_eq!(head.hash, a2.hash());
        assert_eq!(head.total_difficulty, U256::from(48u64));
        assert_eq!(selector.main_chain_hash_at(1).unwrap(), Some(a1.hash()));

        let level1 = selector.index().get_block_infos_at_level(1).unwrap();
        let order: Vec<_> = level1.iter().map(|i| i.hash).collect();
        assert_eq!(order, vec![a1.hash(), b1.hash()]);

        assert_eq!(import(&selector, &a2), ImportResult::AlreadyExists);

        // The executor kept a2's state, so the chain grows past the restart.
        let a3 = mining_child(&a2, 16, 4);
        assert_eq!(import(&selector, &a3), ImportResult::ImportedBest);
        assert!(gate.acquire().unwrap().has_state(&a3.hash()));
    }

    #[test]
    fn test_corrupted_difficulty_repaired_on_open() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();

        let a1 = mining_child(&genesis(), 16, 1);
        let a2 = mining_child(&a1, 16, 2);
        let a3 = mining_child(&a2, 16, 3);
        {
            let selector = DiskSelector::with_genesis(deps(dir.path()), &genesis()).unwrap();
            for h in [&a1, &a2, &a3] {
                import(&selector, h);
            }
        }

        {
            let mut kv = FileBackedKVStore::open(dir.path().join(DiskIndex::INDEX_FILE)).unwrap();
            let mut level = decode_level(&kv.get(&level_key(2)).unwrap().unwrap()).unwrap();
            level[0].cumulative_difficulty += U256::from(1_000u64);
            kv.put(&level_key(2), &encode_level(&level)).unwrap();
            kv.commit().unwrap();
        }

        let selector = DiskSelector::open(deps(dir.path())).unwrap();
        assert_eq!(selector.total_difficulty(), U256::from(64u64));
        assert_eq!(
            selector.index().index_integrity_check().unwrap(),
            IntegrityCheckResult::Correct
        );
        assert_eq!(
            selector.index().get_block_infos_at_level(2).unwrap()[0].cumulative_difficulty,
            U256::from(48u64)
        );
    }

    #[test]
    fn test_missing_genesis_blocks_open() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        {
            let selector = DiskSelector::with_genesis(deps(dir.path()), &genesis()).unwrap();
            import(&selector, &mining_child(&genesis(), 16, 1));
        }

        {
            let mut kv = FileBackedKVStore::open(dir.path().join(DiskIndex::INDEX_FILE)).unwrap();
            kv.delete(&level_key(0)).unwrap();
            kv.commit().unwrap();
        }

        assert!(matches!(
            DiskSelector::open(deps(dir.path())),
            Err(ConsensusError::IndexCorrupted(
                IntegrityCheckResult::MissingGenesis
            ))
        ));
    }
}
