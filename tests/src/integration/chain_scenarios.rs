//! # Chain Scenarios
//!
//! Acceptance, difficulty and rollback across a whole engine:
//!
//! 1. **Difficulty**: initial targets through height 3, adjustment at 4
//! 2. **Fork choice**: cumulative difficulty only grows
//! 3. **Proof checks**: stake timing, capacity chaining, retirement
//! 4. **Sync**: blocks relayed between nodes over the JSON wire format

#[cfg(test)]
mod tests {
    use crate::fixtures::{account, TestNode, RICH};
    use hc_consensus::domain::proof::{compare_stake_candidates, verify_stake_hit};
    use hc_consensus::{
        from_json, to_json, BlockMode, ConsensusConfig, ConsensusError, HeaderDraft,
        TransactionSummary, Track, ONE_COIN,
    };
    use primitive_types::U256;
    use shared_bus::{ConsensusEvent, EventFilter, EventTopic};
    use shared_types::{BlockId, TransactionId};
    use std::cmp::Ordering;

    // =========================================================================
    // DIFFICULTY
    // =========================================================================

    #[test]
    fn test_initial_target_until_height_four() {
        let node = TestNode::new();
        node.fund("forger", RICH);
        let initial = node.engine.config().initial_stake_base_target;
        let period = node.engine.config().stake_block_period_secs as u32;

        for block in node.extend_stake("forger", 3, period) {
            assert_eq!(block.base_target(), initial, "height {}", block.height());
        }

        // Four blocks spanning exactly four periods keep the average.
        let on_time = node
            .engine
            .push_block(node.stake_block("forger", 4 * period))
            .unwrap();
        assert_eq!(on_time.height(), 4);
        assert_eq!(on_time.base_target(), initial);
    }

    #[test]
    fn test_slow_blocks_raise_target_at_height_four() {
        let node = TestNode::new();
        node.fund("forger", RICH);
        let initial = node.engine.config().initial_stake_base_target;
        let period = node.engine.config().stake_block_period_secs as u32;
        node.extend_stake("forger", 3, period);

        // Elapsed 5 periods over a 4-period window, capped at +10%.
        let slow = node
            .engine
            .push_block(node.stake_block("forger", 5 * period))
            .unwrap();
        assert_eq!(slow.base_target(), initial * 11 / 10);
    }

    #[test]
    fn test_fast_blocks_lower_target_at_height_four() {
        let node = TestNode::new();
        node.fund("forger", RICH);
        let initial = node.engine.config().initial_stake_base_target;
        node.extend_stake("forger", 3, 1);

        let fast = node.engine.push_block(node.stake_block("forger", 4)).unwrap();
        assert_eq!(fast.base_target(), initial * 9 / 10);
    }

    // =========================================================================
    // FORK CHOICE
    // =========================================================================

    #[test]
    fn test_cumulative_difficulty_grows_with_coin_age() {
        let node = TestNode::new();
        node.fund("forger", RICH);
        node.fund("spender", 1_000 * ONE_COIN);
        let spender = account("spender");

        let mut last = node.engine.head().cumulative_difficulty();
        for i in 1..=6u32 {
            let transactions = if i % 2 == 0 {
                vec![TransactionSummary {
                    id: TransactionId(u64::from(i)),
                    sender_id: spender,
                    amount: 100 * ONE_COIN,
                    fee: ONE_COIN,
                }]
            } else {
                Vec::new()
            };
            let header = node.stake_block_with("forger", i * 30, transactions);
            let block = node.engine.push_block(header).unwrap();
            assert!(block.cumulative_difficulty() > last);
            assert!(node.engine.prefers(block.cumulative_difficulty() + U256::one()));
            assert!(!node.engine.prefers(block.cumulative_difficulty()));
            last = block.cumulative_difficulty();
        }
    }

    #[test]
    fn test_spend_adds_sender_coin_age() {
        let with_spend = TestNode::new();
        let without = TestNode::new();
        for node in [&with_spend, &without] {
            node.fund("forger", RICH);
            node.fund("spender", 1_000 * ONE_COIN);
        }
        let tx = TransactionSummary {
            id: TransactionId(1),
            sender_id: account("spender"),
            amount: 300 * ONE_COIN,
            fee: ONE_COIN,
        };

        let a = with_spend
            .engine
            .push_block(with_spend.stake_block_with("forger", 30, vec![tx]))
            .unwrap();
        let b = without
            .engine
            .push_block(without.stake_block("forger", 30))
            .unwrap();
        // 300 coins spent by the sender, 1 coin of fee credited to the forger.
        assert_eq!(
            a.cumulative_difficulty() - b.cumulative_difficulty(),
            U256::from(301u64)
        );
    }

    // =========================================================================
    // PROOF CHECKS
    // =========================================================================

    #[test]
    fn test_stake_non_positive_elapsed_always_rejects() {
        for hit in [0, 1, u64::MAX] {
            assert!(!verify_stake_hit(hit, u64::MAX, u64::MAX, 0));
            assert!(!verify_stake_hit(hit, u64::MAX, u64::MAX, -1));
        }

        let node = TestNode::new();
        node.fund("forger", RICH);
        node.extend_stake("forger", 1, 30);
        let same_second = node.stake_block("forger", 30);
        assert!(matches!(
            node.engine.push_block(same_second),
            Err(ConsensusError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_leader_ordering_cross_multiplies() {
        // A: hit 10, balance 5. B: hit 18, balance 10. 18*5 < 10*10.
        assert_eq!(compare_stake_candidates(18, 10, 10, 5), Ordering::Less);
        assert_eq!(compare_stake_candidates(10, 5, 18, 10), Ordering::Greater);
    }

    #[test]
    fn test_capacity_generation_signature_mismatch_rejected() {
        let config = ConsensusConfig {
            initial_capacity_base_target: u64::MAX,
            ..Default::default()
        };
        let node = TestNode::with_genesis(config, BlockMode::Capacity { nonce: 0 });

        // Deadline is zero against a u64::MAX base target.
        let valid = node.capacity_block("plotter", 11, 500);
        let mut draft = valid.unsigned().clone().into_draft();
        draft.generation_signature[0] ^= 0xff;
        let tampered = draft
            .seal(&Default::default())
            .unwrap()
            .sign(&crate::fixtures::keypair("plotter"));

        let err = node.engine.push_block(tampered).unwrap_err();
        assert!(matches!(err, ConsensusError::InvalidGenerationProof { .. }));
        assert!(err.is_terminal());

        let block = node.engine.push_block(valid).unwrap();
        assert_eq!(block.track(), Track::Capacity);
        assert_eq!(
            block.cumulative_difficulty(),
            U256::from(node.engine.config().capacity_difficulty_bonus)
        );
    }

    #[test]
    fn test_capacity_deadline_not_reached_rejected() {
        let config = ConsensusConfig {
            initial_capacity_base_target: 1,
            ..Default::default()
        };
        let node = TestNode::with_genesis(config, BlockMode::Capacity { nonce: 0 });
        let early = node.capacity_block("plotter", 11, 500);
        assert!(matches!(
            node.engine.push_block(early),
            Err(ConsensusError::InvalidGenerationProof { .. })
        ));
    }

    #[test]
    fn test_capacity_retired_above_height() {
        let config = ConsensusConfig {
            initial_capacity_base_target: u64::MAX,
            capacity_retirement_height: 2,
            ..Default::default()
        };
        let node = TestNode::with_genesis(config, BlockMode::Capacity { nonce: 0 });
        node.fund("forger", RICH);
        node.extend_stake("forger", 2, 30);

        let capacity = node.capacity_block("plotter", 3, 100);
        assert!(matches!(
            node.engine.push_block(capacity),
            Err(ConsensusError::ProofFamilyRetired { height: 2 })
        ));
    }

    #[test]
    fn test_stake_generator_must_be_known() {
        let node = TestNode::new();
        let header = node.stake_block("stranger", 30);
        assert!(matches!(
            node.engine.push_block(header),
            Err(ConsensusError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_tracks_reference_their_own_tip() {
        let config = ConsensusConfig {
            initial_capacity_base_target: u64::MAX,
            ..Default::default()
        };
        let node = TestNode::with_genesis(config, BlockMode::Capacity { nonce: 0 });
        node.fund("forger", RICH);

        let stake = node.extend_stake("forger", 1, 30).remove(0);
        // The capacity proof still chains from genesis, not the stake block.
        let capacity = node
            .engine
            .push_block(node.capacity_block("plotter", 5, 60))
            .unwrap();
        let stake_again = node.extend_stake("forger", 1, 30).remove(0);

        assert_eq!(node.engine.track_tip(Track::Capacity).id(), capacity.id());
        assert_eq!(node.engine.track_tip(Track::Stake).id(), stake_again.id());
        assert_eq!(stake_again.tips().stake, Some(3));
        assert_eq!(stake_again.tips().capacity, Some(2));
        assert_eq!(stake.tips().capacity, Some(0));

        // Rolling back restores the earlier tips.
        node.engine.pop_off_to(1);
        assert_eq!(node.engine.track_tip(Track::Stake).id(), stake.id());
        assert_eq!(node.engine.track_tip(Track::Capacity).height(), 0);
    }

    // =========================================================================
    // SYNC
    // =========================================================================

    #[test]
    fn test_relay_over_wire_between_nodes() {
        let producer = TestNode::new();
        let follower = TestNode::new();
        for node in [&producer, &follower] {
            node.fund("forger", RICH);
        }
        assert_eq!(producer.engine.head().id(), follower.engine.head().id());

        let limits = follower.engine.config().header_limits();
        for block in producer.extend_stake("forger", 5, 30) {
            let json = to_json(block.header()).unwrap();
            let decoded = from_json(&json, &limits).unwrap();
            assert_eq!(&decoded, block.header().as_ref());
            follower.engine.push_block(decoded).unwrap();
        }
        assert_eq!(producer.engine.head().id(), follower.engine.head().id());
        assert_eq!(
            producer.engine.head().cumulative_difficulty(),
            follower.engine.head().cumulative_difficulty()
        );
    }

    #[test]
    fn test_missing_ancestor_then_resolved() {
        let producer = TestNode::new();
        let follower = TestNode::new();
        for node in [&producer, &follower] {
            node.fund("forger", RICH);
        }
        let blocks = producer.extend_stake("forger", 2, 30);

        let child = blocks[1].header().as_ref().clone();
        let err = follower.engine.push_block(child.clone()).unwrap_err();
        assert!(matches!(err, ConsensusError::MissingAncestor { .. }));
        assert!(err.is_retryable());

        follower
            .engine
            .push_block(blocks[0].header().as_ref().clone())
            .unwrap();
        follower.engine.push_block(child).unwrap();
        assert_eq!(follower.engine.height(), 2);
    }

    #[test]
    fn test_reorg_to_heavier_branch() {
        let local = TestNode::new();
        let remote = TestNode::new();
        for node in [&local, &remote] {
            node.fund("a", RICH);
            node.fund("b", RICH);
        }
        local.extend_stake("a", 2, 30);
        let remote_blocks = remote.extend_stake("b", 3, 20);

        let remote_tip = remote.engine.head().cumulative_difficulty();
        assert!(local.engine.prefers(remote_tip));

        let mut sub = local.bus.subscribe(EventFilter::topics(vec![EventTopic::Chain]));
        let popped = local.engine.pop_off_to(0);
        assert_eq!(popped.len(), 2);
        for block in &remote_blocks {
            let sibling = local.engine.push_block(block.header().as_ref().clone());
            assert!(sibling.is_ok());
        }
        assert_eq!(local.engine.head().id(), remote.engine.head().id());

        let events = sub.drain();
        let rolled_back = events
            .iter()
            .filter(|e| matches!(e, ConsensusEvent::BlockRolledBack { .. }))
            .count();
        let linked = events
            .iter()
            .filter(|e| matches!(e, ConsensusEvent::BlockLinked { .. }))
            .count();
        assert_eq!((rolled_back, linked), (2, 3));
    }

    #[test]
    fn test_genesis_with_parent_rejected() {
        let key = crate::fixtures::keypair("genesis");
        let mut draft = HeaderDraft::genesis(*key.public_key().as_bytes(), [0u8; 32]);
        draft.previous_block_id = BlockId(9);
        let header = draft.seal(&Default::default()).unwrap().sign(&key);
        let node = TestNode::new();
        let result = hc_consensus::ConsensusEngine::with_genesis(
            ConsensusConfig::default(),
            header,
            node.ledger.clone(),
            node.bus.clone(),
            node.clock.clone(),
        );
        assert!(matches!(result, Err(ConsensusError::InvalidState(_))));
    }
}
