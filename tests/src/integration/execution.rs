//! # Execution Scenarios
//!
//! Reward crediting, the one-time rollback at the signature-swap block,
//! branch-local execution state, busy-executor timeouts and the fail-stop
//! halt, seen from the node.

#[cfg(test)]
mod tests {
    use crate::fixtures::{genesis, init_tracing, mining_child, unity_config, Node, MINER};
    use hc_block_index::BlockIndexApi;
    use hc_consensus::adapters::InMemoryExecutor;
    use hc_consensus::{ChainSelectorApi, ConsensusError, ImportResult};
    use primitive_types::U256;
    use shared_types::{Address, Block, BlockHeader, Transaction};
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::Duration;

    const ALICE: Address = [0x01; 32];
    const BOB: Address = [0x02; 32];

    fn pay(value: u64, nonce: u64) -> Transaction {
        Transaction::new(ALICE, Some(BOB), U256::from(value), nonce, 21_000, Vec::new())
    }

    fn connect(node: &Node, header: &BlockHeader, txs: Vec<Transaction>) -> ImportResult {
        node.selector
            .try_connect(&Block::new(header.clone(), txs))
            .unwrap()
            .result
    }

    #[test]
    fn test_rollback_applies_once_at_swap_block() {
        init_tracing();
        let bad = pay(70, 0);
        let good = pay(10, 1);
        let mut config = unity_config(2);
        config.fork = config.fork.with_rollback_transactions(vec![bad.hash]);
        let node = Node::new(
            config,
            InMemoryExecutor::new().with_balance(ALICE, U256::from(100u64)),
        );

        // Heights 1..=4 carry the transfers; the swap block is 5.
        let b1 = mining_child(&genesis(), 16, 1);
        connect(&node, &b1, vec![bad.clone(), good.clone()]);
        let mut tip = b1;
        for tag in 2..=4 {
            let next = mining_child(&tip, 16, tag);
            connect(&node, &next, Vec::new());
            tip = next;
        }
        assert_eq!(
            node.gate.acquire().unwrap().balance_at(&tip.hash(), &BOB),
            U256::from(80u64)
        );

        let swap = mining_child(&tip, 16, 5);
        assert_eq!(connect(&node, &swap, Vec::new()), ImportResult::ImportedBest);
        {
            let executor = node.gate.acquire().unwrap();
            assert_eq!(executor.reverted(), &[bad.hash]);
            assert_eq!(executor.balance_at(&swap.hash(), &BOB), U256::from(10u64));
            assert_eq!(executor.balance_at(&swap.hash(), &ALICE), U256::from(90u64));
            assert!(executor.is_applied_at(&swap.hash(), &good.hash));
            assert!(!executor.is_applied_at(&swap.hash(), &bad.hash));
        }

        let after = mining_child(&swap, 16, 6);
        connect(&node, &after, Vec::new());
        assert_eq!(node.gate.acquire().unwrap().reverted().len(), 1);
    }

    #[test]
    fn test_only_canonical_blocks_shape_head_state() {
        init_tracing();
        let transfer = pay(30, 0);
        let node = Node::new(
            unity_config(100),
            InMemoryExecutor::new().with_balance(ALICE, U256::from(100u64)),
        );
        let a1 = mining_child(&genesis(), 16, 1);
        let b1 = mining_child(&genesis(), 16, 2);
        let b2 = mining_child(&b1, 16, 3);

        assert_eq!(
            connect(&node, &a1, vec![transfer.clone()]),
            ImportResult::ImportedBest
        );
        let per_block = {
            let executor = node.gate.acquire().unwrap();
            assert_eq!(executor.balance_at(&a1.hash(), &BOB), U256::from(30u64));
            executor.balance_at(&a1.hash(), &MINER)
        };
        assert!(!per_block.is_zero());

        // The competitor does not see a1's transfer or reward.
        assert_eq!(connect(&node, &b1, Vec::new()), ImportResult::ImportedNotBest);
        assert_eq!(
            node.gate.acquire().unwrap().balance_at(&b1.hash(), &MINER),
            per_block
        );

        assert_eq!(connect(&node, &b2, Vec::new()), ImportResult::ImportedBest);
        let head = node.selector.best_block().hash;
        assert_eq!(head, b2.hash());

        let executor = node.gate.acquire().unwrap();
        assert_eq!(executor.balance_at(&head, &BOB), U256::zero());
        assert_eq!(executor.balance_at(&head, &ALICE), U256::from(100u64));
        assert!(!executor.is_applied_at(&head, &transfer.hash));
        let b2_reward = executor.last_context().unwrap().reward;
        assert_eq!(executor.balance_at(&head, &MINER), per_block + b2_reward);
    }

    #[test]
    fn test_busy_executor_aborts_only_that_import() {
        init_tracing();
        let node = Arc::new(Node::with_timeout(
            unity_config(100),
            InMemoryExecutor::new(),
            Duration::from_millis(100),
        ));
        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let node = Arc::clone(&node);
            thread::spawn(move || {
                let _guard = node.gate.acquire().unwrap();
                held_tx.send(()).unwrap();
                release_rx.recv().unwrap();
            })
        };
        held_rx.recv().unwrap();

        let b1 = mining_child(&genesis(), 16, 1);
        let err = node
            .selector
            .try_connect(&Block::new(b1.clone(), Vec::new()))
            .unwrap_err();
        assert_eq!(
            err,
            ConsensusError::LockTimeout {
                waited: Duration::from_millis(100)
            }
        );
        assert!(!err.is_fatal());

        release_tx.send(()).unwrap();
        holder.join().unwrap();
        assert_eq!(connect(&node, &b1, Vec::new()), ImportResult::ImportedBest);
    }

    #[test]
    fn test_fatal_error_halts_node() {
        init_tracing();
        let poison = pay(1, 0);
        let node = Node::new(
            unity_config(100),
            InMemoryExecutor::new().with_fatal_transaction(poison.hash),
        );
        let b1 = mining_child(&genesis(), 16, 1);
        connect(&node, &b1, Vec::new());

        let b2 = mining_child(&b1, 16, 2);
        let err = node
            .selector
            .try_connect(&Block::new(b2.clone(), vec![poison]))
            .unwrap_err();
        assert!(err.is_fatal());

        assert_eq!(
            node.selector.try_connect(&Block::new(b2, Vec::new())),
            Err(ConsensusError::Halted)
        );
        assert_eq!(node.selector.best_block().hash, b1.hash());
        assert_eq!(node.index.best_block_hash().unwrap(), Some(b1.hash()));
    }
}
