//! # Production Flows
//!
//! Local block production feeding the consensus engine:
//!
//! - Forger registration and leader election across two accounts
//! - Forged blocks relayed to a follower node
//! - Resubmission after losing a transaction race
//! - Capacity mining from nonce submission to linked block
//! - The Tokio scheduler driving both tracks

#[cfg(test)]
mod tests {
    use crate::fixtures::{account, TestNode, RICH};
    use hc_block_production::{
        BlockPayload, CapacityMiner, EmptyTransactionSource, ProductionConfig, ProductionError,
        ProductionService, StakeForger, TransactionSource,
    };
    use hc_consensus::{
        from_json, to_json, BlockMode, ConsensusConfig, EpochClock, LinkedBlock, ManualClock,
        Track, TransactionSummary, ONE_COIN,
    };
    use shared_bus::{ConsensusEvent, EventFilter, EventTopic};
    use shared_crypto::sha256;
    use shared_types::{AccountId, TransactionId};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn quick_config() -> ProductionConfig {
        ProductionConfig {
            tick_interval_ms: 10,
            submission_retry_backoff_ms: 0,
            ..Default::default()
        }
    }

    fn forger_for(node: &TestNode, source: Arc<dyn TransactionSource>) -> StakeForger {
        StakeForger::new(node.engine.clone(), source, quick_config()).unwrap()
    }

    fn miner_for(node: &TestNode) -> CapacityMiner {
        CapacityMiner::new(
            node.engine.clone(),
            Arc::new(EmptyTransactionSource),
            quick_config(),
        )
        .unwrap()
    }

    fn capacity_node() -> TestNode {
        let config = ConsensusConfig {
            initial_capacity_base_target: u64::MAX,
            ..Default::default()
        };
        TestNode::with_genesis(config, BlockMode::Capacity { nonce: 0 })
    }

    /// Offers one transaction per block, starting with an id the ledger
    /// already consumed.
    struct RacingSource {
        calls: AtomicUsize,
        spender: AccountId,
    }

    impl TransactionSource for RacingSource {
        fn payload(&self, _parent: &LinkedBlock, _timestamp: u32) -> BlockPayload {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as u64;
            let tx = TransactionSummary {
                id: TransactionId(100 + call),
                sender_id: self.spender,
                amount: 5 * ONE_COIN,
                fee: ONE_COIN,
            };
            BlockPayload {
                total_amount: tx.amount,
                total_fee: tx.fee,
                transactions: vec![tx],
                payload_length: 0,
                payload_hash: sha256(&[]),
            }
        }
    }

    // =========================================================================
    // STAKE FORGING
    // =========================================================================

    #[test]
    fn test_register_twice_keeps_one_registration() {
        let node = TestNode::new();
        node.fund("alice", RICH);
        let forger = forger_for(&node, Arc::new(EmptyTransactionSource));
        let mut sub = node
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Forging]));

        let first = forger.start_forging("alice").unwrap();
        let second = forger.start_forging("alice").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(forger.forgers().len(), 1);

        let registered = sub
            .drain()
            .into_iter()
            .filter(|e| matches!(e, ConsensusEvent::LeaderRegistered { .. }))
            .count();
        assert_eq!(registered, 1);

        assert!(forger.stop_forging("alice").unwrap().is_some());
        assert!(forger.stop_forging("alice").unwrap().is_none());
        assert!(forger.forgers().is_empty());
    }

    #[test]
    fn test_empty_secret_phrase_rejected() {
        let node = TestNode::new();
        let forger = forger_for(&node, Arc::new(EmptyTransactionSource));
        assert!(matches!(
            forger.start_forging(""),
            Err(ProductionError::Crypto(_))
        ));
    }

    #[test]
    fn test_best_ranked_forger_wins() {
        let node = TestNode::new();
        node.fund("alice", RICH);
        node.fund("bob", RICH);
        let forger = forger_for(&node, Arc::new(EmptyTransactionSource));
        forger.start_forging("alice").unwrap();
        forger.start_forging("bob").unwrap();

        let ranked = forger.ranked();
        assert_eq!(ranked.len(), 2);
        let leader = ranked[0].account_id;

        let block = forger.tick().unwrap().expect("leader forges");
        assert_eq!(block.generator_id(), leader);
        assert_eq!(block.track(), Track::Stake);
        assert_eq!(block.timestamp(), node.clock.now());
    }

    #[test]
    fn test_forged_blocks_accepted_by_follower() {
        let producer = TestNode::new();
        let follower = TestNode::new();
        for node in [&producer, &follower] {
            node.fund("alice", RICH);
        }
        let forger = forger_for(&producer, Arc::new(EmptyTransactionSource));
        forger.start_forging("alice").unwrap();

        let limits = follower.engine.config().header_limits();
        for _ in 0..4 {
            let block = forger.tick().unwrap().expect("block forged");
            let relayed = from_json(&to_json(block.header()).unwrap(), &limits).unwrap();
            let linked = follower.engine.push_block(relayed).unwrap();
            assert_eq!(linked.id(), block.id());
            assert_eq!(linked.cumulative_difficulty(), block.cumulative_difficulty());

            // Same second: nothing more to do.
            assert!(forger.tick().unwrap().is_none());
            producer.clock.advance(30);
            follower.clock.advance(30);
        }
        assert_eq!(follower.engine.height(), 4);
        assert_eq!(follower.engine.head().generator_id(), account("alice"));
    }

    #[test]
    fn test_resubmits_after_transaction_race() {
        let node = TestNode::new();
        node.fund("alice", RICH);
        node.fund("spender", 1_000 * ONE_COIN);
        node.ledger.consume([TransactionId(100)]);

        let source = Arc::new(RacingSource {
            calls: AtomicUsize::new(0),
            spender: account("spender"),
        });
        let forger = forger_for(&node, source.clone());
        forger.start_forging("alice").unwrap();

        let block = forger.tick().unwrap().expect("second attempt accepted");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(block.header().transactions()[0].id, TransactionId(101));
    }

    /// Always offers an already consumed transaction. Each call costs a
    /// second of manual clock time.
    struct StaleSource {
        clock: Arc<ManualClock>,
        calls: AtomicUsize,
    }

    impl TransactionSource for StaleSource {
        fn payload(&self, _parent: &LinkedBlock, _timestamp: u32) -> BlockPayload {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.clock.advance(1);
            let tx = TransactionSummary {
                id: TransactionId(9),
                sender_id: account("spender"),
                amount: ONE_COIN,
                fee: ONE_COIN,
            };
            BlockPayload {
                total_amount: tx.amount,
                total_fee: tx.fee,
                transactions: vec![tx],
                payload_length: 0,
                payload_hash: sha256(&[]),
            }
        }
    }

    #[test]
    fn test_race_lost_for_whole_window() {
        let node = TestNode::new();
        node.fund("alice", RICH);
        node.ledger.consume([TransactionId(9)]);
        let source = Arc::new(StaleSource {
            clock: node.clock.clone(),
            calls: AtomicUsize::new(0),
        });
        let config = ProductionConfig {
            submission_retry_window_secs: 2,
            ..quick_config()
        };
        let forger = StakeForger::new(node.engine.clone(), source.clone(), config).unwrap();
        forger.start_forging("alice").unwrap();

        let result = forger.tick();
        assert!(matches!(
            result,
            Err(ProductionError::RetryWindowExhausted { window_secs: 2, .. })
        ));
        // Refused at +1s and +2s, window closed at +3s.
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(node.engine.height(), 0);
    }

    // =========================================================================
    // CAPACITY MINING
    // =========================================================================

    #[test]
    fn test_nonce_submission_to_linked_block() {
        let node = capacity_node();
        let miner = miner_for(&node);
        let mut sub = node
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Chain]));

        let info = miner.mining_info();
        assert_eq!(info.height, 1);
        assert_eq!(info.base_target, u64::MAX);

        let submission = miner.submit_nonce("plotter", 42).unwrap();
        assert_eq!(submission.target_height(), 1);

        let block = miner.tick().unwrap().expect("deadline passed");
        assert_eq!(block.track(), Track::Capacity);
        assert_eq!(block.generator_id(), account("plotter"));
        assert!(miner.submissions().is_empty());
        assert_eq!(miner.mining_info().height, 2);

        let linked = sub
            .drain()
            .into_iter()
            .any(|e| matches!(e, ConsensusEvent::BlockLinked { block_id, .. } if block_id == block.id()));
        assert!(linked);
    }

    #[test]
    fn test_stale_submissions_evicted_when_track_moves() {
        let node = capacity_node();
        let miner = miner_for(&node);
        miner.submit_nonce("slow", 1).unwrap();

        // Another node wins height 1 first.
        let won = node.capacity_block("fast", 7, node.clock.now());
        node.engine.push_block(won).unwrap();

        assert!(miner.tick().unwrap().is_none());
        assert!(miner.submission(account("slow")).is_none());
    }

    #[test]
    fn test_submissions_refused_after_retirement() {
        let config = ConsensusConfig {
            initial_capacity_base_target: u64::MAX,
            capacity_retirement_height: 1,
            ..Default::default()
        };
        let node = TestNode::with_genesis(config, BlockMode::Capacity { nonce: 0 });
        node.fund("forger", RICH);
        let miner = miner_for(&node);
        miner.submit_nonce("plotter", 3).unwrap();

        node.extend_stake("forger", 1, 30);
        assert!(matches!(
            miner.submit_nonce("plotter", 4),
            Err(ProductionError::Consensus(_))
        ));
        assert!(miner.tick().unwrap().is_none());
        assert!(miner.submissions().is_empty());
    }

    // =========================================================================
    // SCHEDULER
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_service_produces_on_both_tracks() {
        let node = capacity_node();
        node.fund("alice", RICH);
        let forger = Arc::new(forger_for(&node, Arc::new(EmptyTransactionSource)));
        let miner = Arc::new(miner_for(&node));
        let service =
            ProductionService::new(forger.clone(), miner.clone(), quick_config()).unwrap();
        let mut sub = node
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Chain]));

        miner.submit_nonce("plotter", 1).unwrap();
        service.start();
        service.start();
        assert!(service.is_running());

        let first = timeout(Duration::from_secs(5), async {
            loop {
                if let Some(ConsensusEvent::BlockLinked { track, .. }) = sub.recv().await {
                    return track;
                }
            }
        })
        .await
        .expect("first block within timeout");
        assert_eq!(node.engine.height(), 1);

        forger.start_forging("alice").unwrap();
        node.clock.advance(30);
        let second = timeout(Duration::from_secs(5), async {
            loop {
                if let Some(ConsensusEvent::BlockLinked { track, .. }) = sub.recv().await {
                    return track;
                }
            }
        })
        .await
        .expect("second block within timeout");

        service.stop();
        assert!(!service.is_running());
        assert_eq!(first, Track::Capacity);
        assert_eq!(second, Track::Stake);
        assert_eq!(node.engine.height(), 2);
    }
}
