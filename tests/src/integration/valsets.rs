//! # Validator Set Lifecycle
//!
//! Registry snapshot -> stored valset -> orchestrator confirmations ->
//! update observed on Ethereum -> pruning.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use peggy_bridge::{
        BridgeApi, BridgeError, BridgeParams, BridgeQueries, BridgeStore, BridgeValidator,
        ConfirmOutcome, GenesisState, Valset,
    };
    use peggy_crypto::{keccak256, recover_signer};
    use peggy_types::{AccountAddress, EthAddress, Nonce, ValidatorAddress};

    #[test]
    fn test_stored_valset_checkpoint_matches_contract() {
        let params = BridgeParams {
            peggy_id: "foo".to_string(),
            ..Default::default()
        };
        let mut bridge = TestBridge::with_params(params.clone(), &[]);
        let member: EthAddress = "0xc783df8a850f42e7f7e57013759c285caa701eb6".parse().unwrap();
        let mut genesis = GenesisState::new(params);
        genesis.valsets.push(
            Valset::new(Nonce::new(1), vec![BridgeValidator::new(u32::MAX as u64, member)]).unwrap(),
        );
        bridge.service.init_genesis(genesis).unwrap();

        assert_eq!(
            hex::encode(bridge.service.valset_checkpoint(Nonce::new(1)).unwrap()),
            "c7d4af487213558dcc5e7503fbf803e284c2d6b2bc429ced871c498855c9952c"
        );
    }

    #[test]
    fn test_snapshot_normalizes_power() {
        let mut bridge = TestBridge::new(&[3, 1]);
        let valset = bridge.service.request_valset().unwrap();
        let powers: Vec<u64> = valset.members().iter().map(|m| m.power).collect();
        assert_eq!(powers, vec![3_221_225_471, 1_073_741_823]);
        assert!(valset.total_power() <= u128::from(u32::MAX));
        assert_eq!(valset.members()[0].eth_address, bridge.orchestrators[0].eth_address);
    }

    #[test]
    fn test_validators_without_key_are_left_out() {
        let mut bridge = TestBridge::new(&[10]);
        bridge
            .registry
            .bond(
                ValidatorAddress::new([0x99; 20]),
                10,
                AccountAddress::new([0x98; 20]),
            )
            .unwrap();

        let current = bridge.service.current_valset().unwrap();
        assert_eq!(current.members().len(), 1);
        // Half of the bonded power has no key
        assert_eq!(current.members()[0].power, u64::from(u32::MAX) / 2);

        let orphan = AccountAddress::new([0x98; 20]);
        assert!(matches!(
            bridge.service.confirm_valset(&orphan, Nonce::new(1), &[0u8; 65]),
            Err(BridgeError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_rotation_and_pruning() {
        let mut bridge = TestBridge::new(&[10, 10]);
        let first = bridge.service.update_valset_if_changed().unwrap().unwrap();
        for i in 0..2 {
            bridge.confirm_valset(i, first.nonce()).unwrap();
        }
        assert!(bridge.service.update_valset_if_changed().unwrap().is_none());

        let v1 = bridge.orchestrators[1].validator;
        bridge.registry.set_power(&v1, 20).unwrap();
        let second = bridge.service.update_valset_if_changed().unwrap().unwrap();
        assert_eq!(second.nonce(), Nonce::new(2));

        let v0 = bridge.orchestrators[0].validator;
        assert_eq!(
            bridge.service.last_pending_valset_for(&v0).unwrap(),
            Some(second.clone())
        );
        bridge.confirm_valset(0, second.nonce()).unwrap();
        bridge.confirm_valset(1, second.nonce()).unwrap();

        // Contract-side check of the new set's signatures
        let checkpoint = bridge.service.valset_checkpoint(second.nonce()).unwrap();
        for confirm in bridge.service.valset_confirms(second.nonce()).unwrap() {
            assert_eq!(
                recover_signer(&checkpoint, confirm.signature.as_bytes()).unwrap(),
                confirm.eth_address
            );
        }

        bridge.claim_from(&[0, 1], &valset_executed(1, 2));
        assert!(bridge.service.valset_by_nonce(first.nonce()).unwrap().is_none());
        assert!(bridge.service.valset_confirms(first.nonce()).unwrap().is_empty());
        assert_eq!(bridge.store.observed_valset_nonce().unwrap(), Some(Nonce::new(2)));
        assert_eq!(bridge.service.latest_valsets(5).unwrap(), vec![second]);
    }

    #[test]
    fn test_stale_valset_execution_ignored() {
        let mut bridge = TestBridge::new(&[10]);
        bridge.service.request_valset().unwrap();
        bridge.service.request_valset().unwrap();
        bridge.claim(0, valset_executed(1, 2)).unwrap();
        // Finalizes, but does not move the observed valset backwards
        bridge.claim(0, valset_executed(2, 1)).unwrap();
        assert_eq!(bridge.store.observed_valset_nonce().unwrap(), Some(Nonce::new(2)));
    }

    #[test]
    fn test_newcomer_confirms_from_oldest_stored() {
        let mut bridge = TestBridge::new(&[10]);
        bridge.service.request_valset().unwrap();
        bridge.confirm_valset(0, Nonce::new(1)).unwrap();

        let newcomer = bridge.bond(10);
        let second = bridge.service.update_valset_if_changed().unwrap().unwrap();
        assert_eq!(second.members().len(), 2);

        assert_eq!(
            bridge.confirm_valset(newcomer, second.nonce()).unwrap_err(),
            BridgeError::OutOfSequence {
                expected: Nonce::new(1),
                got: second.nonce()
            }
        );
        assert_eq!(
            bridge.confirm_valset(newcomer, Nonce::new(1)).unwrap(),
            ConfirmOutcome::Stored
        );
        assert_eq!(
            bridge.confirm_valset(newcomer, second.nonce()).unwrap(),
            ConfirmOutcome::Stored
        );
    }

    #[test]
    fn test_missed_valset_confirmations() {
        let mut bridge = TestBridge::new(&[10, 10, 10]);
        bridge.service.request_valset().unwrap();
        bridge.confirm_valset(1, Nonce::new(1)).unwrap();

        let missed: Vec<ValidatorAddress> = bridge
            .service
            .report_missed_valset_confirmations(Nonce::new(1))
            .unwrap()
            .iter()
            .map(|s| s.validator())
            .collect();
        assert_eq!(
            missed,
            vec![
                bridge.orchestrators[0].validator,
                bridge.orchestrators[2].validator
            ]
        );
        assert_eq!(bridge.sink.pending().unwrap().len(), 2);
    }

    #[test]
    fn test_key_registration_rules() {
        let mut bridge = TestBridge::new(&[10]);
        let stranger = ValidatorAddress::new([0x77; 20]);
        let orch = &bridge.orchestrators[0];
        let proof = orch.sign(&keccak256(stranger.as_bytes()));
        let eth_address = orch.eth_address;

        assert!(matches!(
            bridge.service.set_eth_address(&stranger, eth_address, &proof),
            Err(BridgeError::Unauthorized(_))
        ));
        let v0 = bridge.orchestrators[0].validator;
        assert!(matches!(
            bridge.service.set_eth_address(&v0, EthAddress::ZERO, &proof),
            Err(BridgeError::Invalid(_))
        ));
        // Truncated signature
        assert!(matches!(
            bridge.service.set_eth_address(&v0, eth_address, &proof[..64]),
            Err(BridgeError::Invalid(_))
        ));
    }

    #[test]
    fn test_request_valset_without_keys() {
        let mut bridge = TestBridge::new(&[]);
        assert!(matches!(
            bridge.service.request_valset(),
            Err(BridgeError::Invalid(_))
        ));
        assert!(bridge.service.update_valset_if_changed().unwrap().is_none());
    }
}
