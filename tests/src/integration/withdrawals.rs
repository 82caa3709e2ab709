//! # Withdrawal Flow
//!
//! send_to_eth -> pool -> batch -> orchestrator confirmations -> execution
//! observed on Ethereum.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use peggy_bridge::{
        BatchStatus, BridgeApi, BridgeError, BridgeQueries, ClaimOutcome, ConfirmOutcome,
        ConfirmStream, SlashingSignal,
    };
    use peggy_crypto::recover_signer;
    use peggy_types::{AccountAddress, EthAddress, Nonce, U256};

    fn alice() -> AccountAddress {
        AccountAddress::new([0xa1; 20])
    }

    fn send(bridge: &mut TestBridge, contract: EthAddress, amount: u64, fee: u64) -> u64 {
        bridge
            .service
            .send_to_eth(
                &alice(),
                EthAddress::new([0xde; 20]),
                erc20(amount, contract),
                erc20(fee, contract),
            )
            .unwrap()
    }

    #[test]
    fn test_full_round_trip() {
        let mut bridge = TestBridge::new(&[10, 10, 10]);
        let token = max_token();

        let outcomes = bridge.claim_from(&[0, 1, 2], &deposit(1, 1_000, token, alice()));
        assert_eq!(outcomes.last(), Some(&ClaimOutcome::Finalized));
        assert_eq!(bridge.balance(&alice(), &token), U256::from(1_000u64));

        bridge.service.request_valset().unwrap();
        for i in 0..3 {
            assert_eq!(
                bridge.confirm_valset(i, Nonce::new(1)).unwrap(),
                ConfirmOutcome::Stored
            );
        }

        send(&mut bridge, token, 100, 5);
        send(&mut bridge, token, 200, 10);
        send(&mut bridge, token, 50, 1);
        assert_eq!(bridge.balance(&alice(), &token), U256::from(634u64));
        assert_eq!(bridge.service.pending_transfers(&token).unwrap().len(), 3);

        let batch = bridge.service.build_batch(&token).unwrap();
        let ids: Vec<u64> = batch.elements.iter().map(|tx| tx.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(batch.total_fee.amount, U256::from(16u64));
        assert!(bridge.service.pending_transfers(&token).unwrap().is_empty());

        for i in 0..3 {
            assert_eq!(
                bridge.confirm_batch(i, &token, batch.nonce).unwrap(),
                ConfirmOutcome::Stored
            );
        }
        assert_eq!(
            bridge.confirm_batch(0, &token, batch.nonce).unwrap(),
            ConfirmOutcome::Duplicate
        );

        // What the contract checks: every signature recovers to a valset member
        let checkpoint = bridge.service.batch_checkpoint(&token, batch.nonce).unwrap();
        let confirms = bridge.service.batch_confirms(&token, batch.nonce).unwrap();
        assert_eq!(confirms.len(), 3);
        for confirm in &confirms {
            let signer = recover_signer(&checkpoint, confirm.signature.as_bytes()).unwrap();
            assert_eq!(signer, confirm.eth_address);
        }

        let outcomes = bridge.claim_from(&[0, 1, 2], &batch_executed(1, batch.nonce, token));
        assert_eq!(outcomes.last(), Some(&ClaimOutcome::Finalized));
        let archived = bridge
            .service
            .batch_by_nonce(&token, batch.nonce)
            .unwrap()
            .unwrap();
        assert_eq!(archived.status, BatchStatus::ObservedExecuted);
        assert!(bridge.service.outgoing_batches().unwrap().is_empty());
        assert!(bridge.service.pending_transfers(&token).unwrap().is_empty());
        assert_eq!(bridge.balance(&alice(), &token), U256::from(634u64));
    }

    #[test]
    fn test_execution_cancels_older_batches_of_same_token() {
        let mut bridge = TestBridge::new(&[10]);
        let t1 = max_token();
        let t2 = token(0x22);
        bridge.fund(&alice(), &t1, 1_000);
        bridge.fund(&alice(), &t2, 1_000);
        bridge.service.request_valset().unwrap();

        send(&mut bridge, t1, 10, 1);
        let first = bridge.service.build_batch(&t1).unwrap();
        send(&mut bridge, t2, 10, 1);
        let other = bridge.service.build_batch(&t2).unwrap();
        send(&mut bridge, t1, 20, 2);
        let third = bridge.service.build_batch(&t1).unwrap();
        assert_eq!(
            (first.nonce, other.nonce, third.nonce),
            (Nonce::new(1), Nonce::new(2), Nonce::new(3))
        );

        bridge.confirm_batch(0, &t1, first.nonce).unwrap();
        assert_eq!(
            bridge.claim(0, batch_executed(1, third.nonce, t1)).unwrap(),
            ClaimOutcome::Finalized
        );

        assert!(bridge.service.batch_by_nonce(&t1, first.nonce).unwrap().is_none());
        assert!(bridge.service.batch_confirms(&t1, first.nonce).unwrap().is_empty());
        assert_eq!(bridge.service.pending_transfers(&t1).unwrap(), first.elements);
        assert_eq!(bridge.service.pending_batch(&t1).unwrap(), None);
        assert_eq!(bridge.service.pending_batch(&t2).unwrap(), Some(other));
    }

    #[test]
    fn test_cancelled_transfers_can_be_batched_again() {
        let mut bridge = TestBridge::new(&[10]);
        let token = max_token();
        bridge.fund(&alice(), &token, 1_000);
        bridge.service.request_valset().unwrap();

        send(&mut bridge, token, 10, 1);
        bridge.service.build_batch(&token).unwrap();
        send(&mut bridge, token, 10, 2);
        let second = bridge.service.build_batch(&token).unwrap();
        bridge.claim(0, batch_executed(1, second.nonce, token)).unwrap();

        let rebuilt = bridge.service.build_batch(&token).unwrap();
        assert_eq!(rebuilt.nonce, Nonce::new(3));
        assert_eq!(rebuilt.elements[0].id, 1);
    }

    #[test]
    fn test_batch_confirms_follow_nonce_order() {
        let mut bridge = TestBridge::new(&[10, 10]);
        let token = max_token();
        bridge.fund(&alice(), &token, 1_000);
        bridge.service.request_valset().unwrap();
        send(&mut bridge, token, 10, 1);
        let first = bridge.service.build_batch(&token).unwrap();
        send(&mut bridge, token, 10, 1);
        let second = bridge.service.build_batch(&token).unwrap();

        assert_eq!(
            bridge.confirm_batch(0, &token, second.nonce).unwrap_err(),
            BridgeError::OutOfSequence {
                expected: first.nonce,
                got: second.nonce
            }
        );
        bridge.confirm_batch(0, &token, first.nonce).unwrap();
        bridge.confirm_batch(0, &token, second.nonce).unwrap();

        let v0 = bridge.orchestrators[0].validator;
        assert_eq!(
            bridge
                .service
                .last_confirmed_nonce(&v0, &ConfirmStream::Batch(token))
                .unwrap(),
            second.nonce
        );
        let v1 = bridge.orchestrators[1].validator;
        assert_eq!(
            bridge.service.last_pending_batch_for(&v1).unwrap(),
            Some(first)
        );
        assert_eq!(bridge.service.last_pending_batch_for(&v0).unwrap(), None);
    }

    #[test]
    fn test_missed_batch_confirmations() {
        let mut bridge = TestBridge::new(&[10, 10]);
        let token = max_token();
        bridge.fund(&alice(), &token, 100);
        bridge.service.request_valset().unwrap();
        send(&mut bridge, token, 10, 1);
        let batch = bridge.service.build_batch(&token).unwrap();
        bridge.confirm_batch(0, &token, batch.nonce).unwrap();

        let signals = bridge
            .service
            .report_missed_batch_confirmations(&token, batch.nonce)
            .unwrap();
        assert_eq!(
            signals,
            vec![SlashingSignal::MissedConfirmation {
                validator: bridge.orchestrators[1].validator,
                stream: ConfirmStream::Batch(token),
                nonce: batch.nonce,
            }]
        );
        assert!(matches!(
            bridge
                .service
                .report_missed_batch_confirmations(&token, Nonce::new(99)),
            Err(BridgeError::NotFound(_))
        ));
    }

    #[test]
    fn test_send_to_eth_validation() {
        let mut bridge = TestBridge::new(&[10]);
        let max = max_token();
        bridge.fund(&alice(), &max, 50);

        // Fee in another token
        assert!(matches!(
            bridge.service.send_to_eth(
                &alice(),
                EthAddress::new([0xde; 20]),
                erc20(10, max),
                erc20(1, token(0x33)),
            ),
            Err(BridgeError::Invalid(_))
        ));
        // Empty destination
        assert!(matches!(
            bridge
                .service
                .send_to_eth(&alice(), EthAddress::ZERO, erc20(10, max), erc20(1, max)),
            Err(BridgeError::Invalid(_))
        ));
        // Amount plus fee exceeds the balance
        assert!(matches!(
            bridge.service.send_to_eth(
                &alice(),
                EthAddress::new([0xde; 20]),
                erc20(50, max),
                erc20(1, max),
            ),
            Err(BridgeError::Invalid(_))
        ));
        assert_eq!(bridge.balance(&alice(), &max), U256::from(50u64));
        assert!(bridge.service.pending_transfers(&max).unwrap().is_empty());
    }

    #[test]
    fn test_executed_claim_for_unknown_batch_still_advances() {
        let mut bridge = TestBridge::new(&[10]);
        assert_eq!(
            bridge
                .claim(0, batch_executed(1, Nonce::new(42), max_token()))
                .unwrap(),
            ClaimOutcome::Finalized
        );
        assert_eq!(
            bridge
                .service
                .last_observed_nonce(peggy_bridge::ClaimType::WithdrawalBatchExecuted)
                .unwrap(),
            Nonce::new(1)
        );
    }
}
