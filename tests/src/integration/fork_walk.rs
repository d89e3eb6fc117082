//! # Fork Walk
//!
//! Drives one chain through `PreHybrid → Hybrid → HybridSignatureSwap` with
//! alternating mining and staking blocks, checking the accepted seal
//! types, seed schemes and reward eras at each height.

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        genesis, init_tracing, mining_child, mining_child_after, staking_child, unity_config,
        Node, MINER, STAKER,
    };
    use hc_block_index::{BlockIndexApi, IntegrityCheckResult};
    use hc_consensus::adapters::InMemoryExecutor;
    use hc_consensus::{ChainSelectorApi, ForkPhase, ImportResult, RewardConfig};
    use primitive_types::U256;
    use shared_types::{Block, BlockHeader, SIGNATURE_SEED_LEN, VRF_SEED_LEN};

    fn connect(node: &Node, header: &BlockHeader) -> hc_consensus::ImportSummary {
        node.selector
            .try_connect(&Block::new(header.clone(), Vec::new()))
            .unwrap()
    }

    #[test]
    fn test_walk_through_both_forks() {
        init_tracing();
        let node = Node::new(unity_config(2), InMemoryExecutor::new());
        let fork = node.selector.fork().clone();
        let rewards = RewardConfig::default();
        let mut expected_miner = U256::zero();
        let mut expected_staker = U256::zero();

        // Height 1: pre-hybrid, staking refused, mining on the ramp.
        assert_eq!(fork.state_at(1).phase(), ForkPhase::PreHybrid);
        let refused = connect(&node, &staking_child(&genesis(), SIGNATURE_SEED_LEN, 1));
        assert_eq!(refused.result, ImportResult::Invalid);

        let b1 = mining_child(&genesis(), 16, 1);
        let s = connect(&node, &b1);
        assert_eq!(s.result, ImportResult::ImportedBest);
        assert!(s.reward > rewards.ramp_up_start && s.reward < rewards.block_reward);
        expected_miner += s.reward;

        // Heights 2-4: hybrid, staking with signature seeds, fixed rewards.
        assert!(fork.is_hybrid_fork_block(2));
        let s2 = staking_child(&b1, SIGNATURE_SEED_LEN, 2);
        let s = connect(&node, &s2);
        assert_eq!(s.result, ImportResult::ImportedBest);
        assert_eq!(s.reward, rewards.fixed_reward);
        expected_staker += s.reward;

        let b3 = mining_child(&s2, 16, 3);
        let s = connect(&node, &b3);
        assert_eq!(s.reward, rewards.fixed_reward);
        expected_miner += s.reward;

        let s4 = staking_child(&b3, SIGNATURE_SEED_LEN, 4);
        expected_staker += connect(&node, &s4).reward;

        // Height 5: signature swap, VRF seeds, time-varying mining rewards.
        assert_eq!(fork.state_at(5).phase(), ForkPhase::HybridSignatureSwap);
        assert_eq!(
            connect(&node, &staking_child(&s4, SIGNATURE_SEED_LEN, 5)).result,
            ImportResult::Invalid
        );
        let s5 = staking_child(&s4, VRF_SEED_LEN, 5);
        let s = connect(&node, &s5);
        assert_eq!(s.result, ImportResult::ImportedBest);
        assert_eq!(s.reward, rewards.fixed_reward);
        expected_staker += s.reward;

        let quick = mining_child_after(&s5, 5, 16, 6);
        let s = connect(&node, &quick);
        assert_eq!(s.reward, rewards.fixed_reward / U256::from(2u64));
        expected_miner += s.reward;

        let slow = mining_child_after(&quick, 60, 16, 7);
        let s = connect(&node, &slow);
        assert_eq!(s.reward, rewards.max_mining_reward);
        expected_miner += s.reward;

        let executor = node.gate.acquire().unwrap();
        assert_eq!(executor.balance_at(&slow.hash(), &MINER), expected_miner);
        assert_eq!(executor.balance_at(&slow.hash(), &STAKER), expected_staker);
        assert_eq!(executor.committed_blocks(), 7);
        drop(executor);

        assert_eq!(node.selector.best_block().number, 7);
        assert_eq!(
            node.index.index_integrity_check().unwrap(),
            IntegrityCheckResult::Correct
        );
    }

    #[test]
    fn test_flags_never_revert_along_chain() {
        let node = Node::new(unity_config(2), InMemoryExecutor::new());
        let fork = node.selector.fork();
        let phases: Vec<_> = (0..20).map(|h| fork.state_at(h).phase()).collect();
        assert!(phases.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(phases[1], ForkPhase::PreHybrid);
        assert_eq!(phases[2], ForkPhase::Hybrid);
        assert_eq!(phases[5], ForkPhase::HybridSignatureSwap);
    }
}
