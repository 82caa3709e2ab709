//! # Deposit Flow
//!
//! Ethereum lock event -> orchestrator claims -> attestation -> voucher mint.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use peggy_bridge::{
        voucher_denom, BridgeError, BridgeQueries, BridgeStore, ClaimOutcome, ClaimType,
        SlashingSignal,
    };
    use peggy_types::{AccountAddress, Nonce, U256};

    fn alice() -> AccountAddress {
        AccountAddress::new([0xa1; 20])
    }

    #[test]
    fn test_voucher_denom_of_test_token() {
        assert_eq!(voucher_denom(&max_token(), "MAX"), "peggy39b512461b");
    }

    #[test]
    fn test_deposit_needs_strict_supermajority() {
        // 40 + 30 = 70 > 2/3 of 100
        let mut bridge = TestBridge::new(&[40, 30, 20, 10]);
        let claim = deposit(1, 1_000, max_token(), alice());

        assert_eq!(bridge.claim(3, claim.clone()).unwrap(), ClaimOutcome::Accepted);
        assert_eq!(bridge.claim(2, claim.clone()).unwrap(), ClaimOutcome::Accepted);
        assert_eq!(bridge.balance(&alice(), &max_token()), U256::zero());

        assert_eq!(bridge.claim(0, claim.clone()).unwrap(), ClaimOutcome::Finalized);
        assert_eq!(bridge.balance(&alice(), &max_token()), U256::from(1_000u64));

        assert_eq!(bridge.claim(1, claim).unwrap(), ClaimOutcome::AuditRecorded);
        assert_eq!(bridge.balance(&alice(), &max_token()), U256::from(1_000u64));
    }

    #[test]
    fn test_exactly_two_thirds_is_not_enough() {
        let mut bridge = TestBridge::new(&[20, 10]);
        let claim = deposit(1, 5, max_token(), alice());
        assert_eq!(bridge.claim(0, claim).unwrap(), ClaimOutcome::Accepted);
        assert_eq!(
            bridge.service.last_observed_nonce(ClaimType::Deposit).unwrap(),
            Nonce::new(0)
        );
    }

    #[test]
    fn test_byzantine_minority_cannot_mint() {
        let mut bridge = TestBridge::new(&[25, 25, 25, 25]);
        let real = deposit(1, 100, max_token(), alice());
        let fake = deposit(1, 1_000_000, max_token(), AccountAddress::new([0x66; 20]));

        assert_eq!(
            bridge.claim_from(&[0], &fake),
            vec![ClaimOutcome::Accepted]
        );
        assert_eq!(
            bridge.claim_from(&[1, 2, 3], &real),
            vec![
                ClaimOutcome::Accepted,
                ClaimOutcome::Accepted,
                ClaimOutcome::Finalized
            ]
        );

        assert_eq!(bridge.balance(&alice(), &max_token()), U256::from(100u64));
        assert_eq!(
            bridge.balance(&AccountAddress::new([0x66; 20]), &max_token()),
            U256::zero()
        );
        let winner = bridge
            .service
            .attestation(ClaimType::Deposit, Nonce::new(1))
            .unwrap()
            .unwrap();
        assert!(winner.finalized);
        assert_eq!(winner.details_hash, real.details_fingerprint());
    }

    #[test]
    fn test_equivocator_is_reported_and_not_counted_twice() {
        let mut bridge = TestBridge::new(&[34, 33, 33]);
        let a = deposit(1, 7, max_token(), alice());
        let b = deposit(1, 8, max_token(), alice());

        assert_eq!(bridge.claim(0, a.clone()).unwrap(), ClaimOutcome::Accepted);
        assert_eq!(bridge.claim(0, b.clone()).unwrap(), ClaimOutcome::Equivocation);
        // The second claim carries no power: one honest vote on b is not enough
        assert_eq!(bridge.claim(1, b.clone()).unwrap(), ClaimOutcome::Accepted);
        let on_b = bridge
            .store
            .get_attestation(ClaimType::Deposit, Nonce::new(1), &b.details_fingerprint())
            .unwrap()
            .unwrap();
        assert_eq!(on_b.attested_power(), 33);

        // The first vote still counts
        assert_eq!(bridge.claim(2, a).unwrap(), ClaimOutcome::Finalized);
        assert_eq!(bridge.balance(&alice(), &max_token()), U256::from(7u64));

        let signals = bridge.sink.drain().unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].validator(), bridge.orchestrators[0].validator);
        assert!(matches!(signals[0], SlashingSignal::Equivocation { .. }));
    }

    #[test]
    fn test_waiting_for_finalization_does_not_hide_equivocation() {
        let mut bridge = TestBridge::new(&[10, 10, 10]);
        let a = deposit(1, 5, max_token(), alice());
        let b = deposit(1, 9, max_token(), alice());
        assert_eq!(bridge.claim_from(&[0, 1, 2], &a).last(), Some(&ClaimOutcome::Finalized));

        assert_eq!(bridge.claim(0, b).unwrap(), ClaimOutcome::Equivocation);
        assert_eq!(bridge.balance(&alice(), &max_token()), U256::from(5u64));
        let signals = bridge.sink.drain().unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].validator(), bridge.orchestrators[0].validator);
    }

    #[test]
    fn test_stalled_stream_resumes_after_unbonding() {
        let mut bridge = TestBridge::new(&[10, 10, 10]);
        let claim = deposit(1, 4, max_token(), alice());
        bridge.claim_from(&[0, 1], &claim);

        let v2 = bridge.orchestrators[2].validator;
        bridge.registry.unbond(&v2).unwrap();
        assert_eq!(bridge.claim(0, claim).unwrap(), ClaimOutcome::Finalized);
        assert_eq!(bridge.balance(&alice(), &max_token()), U256::from(4u64));
        assert_eq!(
            bridge.claim(0, deposit(2, 1, max_token(), alice())).unwrap(),
            ClaimOutcome::Accepted
        );
    }

    #[test]
    fn test_nonces_are_strictly_sequential() {
        let mut bridge = TestBridge::new(&[10]);
        for nonce in 1..=5 {
            assert_eq!(
                bridge
                    .claim(0, deposit(nonce, 1, max_token(), alice()))
                    .unwrap(),
                ClaimOutcome::Finalized
            );
        }
        assert_eq!(bridge.balance(&alice(), &max_token()), U256::from(5u64));

        let err = bridge
            .claim(0, deposit(7, 1, max_token(), alice()))
            .unwrap_err();
        assert_eq!(
            err,
            BridgeError::OutOfSequence {
                expected: Nonce::new(6),
                got: Nonce::new(7)
            }
        );
    }

    #[test]
    fn test_votes_keep_power_at_vote_time() {
        let mut bridge = TestBridge::new(&[10, 10, 10]);
        let claim = deposit(1, 1, max_token(), alice());
        bridge.claim(0, claim.clone()).unwrap();

        let v0 = bridge.orchestrators[0].validator;
        bridge.registry.set_power(&v0, 1).unwrap();
        bridge.claim(1, claim).unwrap();

        let attestation = bridge
            .service
            .attestation(ClaimType::Deposit, Nonce::new(1))
            .unwrap()
            .unwrap();
        assert_eq!(attestation.attested_power(), 20);
        // 20 of 21 now bonded
        assert!(attestation.finalized);
    }

    #[test]
    fn test_unbonding_lowers_the_bar() {
        let mut bridge = TestBridge::new(&[10, 10, 10]);
        let claim = deposit(1, 3, max_token(), alice());
        assert_eq!(bridge.claim(0, claim.clone()).unwrap(), ClaimOutcome::Accepted);

        let v2 = bridge.orchestrators[2].validator;
        bridge.registry.unbond(&v2).unwrap();
        assert!(matches!(
            bridge.claim(2, claim.clone()),
            Err(BridgeError::Unauthorized(_))
        ));
        assert_eq!(bridge.claim(1, claim).unwrap(), ClaimOutcome::Finalized);
        assert_eq!(bridge.balance(&alice(), &max_token()), U256::from(3u64));
    }

    #[test]
    fn test_malformed_claims_rejected() {
        let mut bridge = TestBridge::new(&[10]);
        assert!(matches!(
            bridge.claim(0, deposit(1, 0, max_token(), alice())),
            Err(BridgeError::Invalid(_))
        ));
        assert!(matches!(
            bridge.claim(0, deposit(1, 5, max_token(), AccountAddress::new([0; 20]))),
            Err(BridgeError::Invalid(_))
        ));
        assert!(matches!(
            bridge.claim(0, valset_executed(1, 0)),
            Err(BridgeError::Invalid(_))
        ));
        assert_eq!(
            bridge.service.last_observed_nonce(ClaimType::Deposit).unwrap(),
            Nonce::new(0)
        );
    }
}
