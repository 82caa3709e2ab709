//! # Genesis Import/Export
//!
//! A chain restarted from an exported genesis must continue exactly where
//! the old one stopped.

#[cfg(test)]
mod tests {
    use crate::harness::*;
    use peggy_bridge::{
        BridgeApi, BridgeError, BridgeParams, BridgeQueries, ClaimOutcome, ClaimType,
        ConfirmStream, GenesisState,
    };
    use peggy_types::{AccountAddress, EthAddress, Nonce};

    /// A bridge with something in every table.
    fn busy_bridge() -> TestBridge {
        let mut bridge = TestBridge::new(&[10, 10, 10]);
        let token = max_token();
        let alice = AccountAddress::new([0xa1; 20]);

        bridge.claim_from(&[0, 1, 2], &deposit(1, 500, token, alice));
        bridge.claim(0, deposit(2, 9, token, alice)).unwrap();

        bridge.service.request_valset().unwrap();
        bridge.confirm_valset(0, Nonce::new(1)).unwrap();

        for fee in 1..=3 {
            bridge
                .service
                .send_to_eth(
                    &alice,
                    EthAddress::new([0xde; 20]),
                    erc20(10, token),
                    erc20(fee, token),
                )
                .unwrap();
        }
        let batch = bridge.service.build_batch(&token).unwrap();
        bridge.confirm_batch(1, &token, batch.nonce).unwrap();
        bridge
    }

    fn restart(genesis: GenesisState) -> TestBridge {
        let mut bridge = TestBridge::with_params(BridgeParams::default(), &[]);
        bridge.service.init_genesis(genesis).unwrap();
        // Staking lives outside the bridge; keys come back with the genesis
        for _ in 0..3 {
            bridge.bond_without_key(10);
        }
        bridge
    }

    #[test]
    fn test_export_import_round_trip() {
        let bridge = busy_bridge();
        let exported = bridge.service.export_genesis().unwrap();
        assert_eq!(exported.valsets.len(), 1);
        assert_eq!(exported.valset_confirms.len(), 1);
        assert_eq!(exported.batches.len(), 1);
        assert_eq!(exported.batch_confirms.len(), 1);
        assert_eq!(exported.attestations.len(), 2);
        assert_eq!(exported.eth_addresses.len(), 3);
        assert_eq!(exported.last_transfer_id, 3);
        assert_eq!(exported.last_batch_nonce, Nonce::new(1));

        let json = exported.to_json().unwrap();
        let restored = restart(GenesisState::from_json(&json).unwrap());
        assert_eq!(restored.service.export_genesis().unwrap(), exported);
    }

    #[test]
    fn test_restarted_chain_continues() {
        let bridge = busy_bridge();
        let mut restored = restart(bridge.service.export_genesis().unwrap());
        let token = max_token();
        let alice = AccountAddress::new([0xa1; 20]);

        assert_eq!(
            restored
                .service
                .last_observed_nonce(ClaimType::Deposit)
                .unwrap(),
            Nonce::new(1)
        );
        // Pending deposit 2 already carries validator 0's vote
        assert_eq!(
            restored.claim(0, deposit(2, 9, token, alice)).unwrap(),
            ClaimOutcome::Duplicate
        );
        restored.claim(1, deposit(2, 9, token, alice)).unwrap();
        assert_eq!(
            restored.claim(2, deposit(2, 9, token, alice)).unwrap(),
            ClaimOutcome::Finalized
        );

        // Confirmation cursors survived
        let v1 = restored.orchestrators[1].validator;
        assert_eq!(
            restored
                .service
                .last_confirmed_nonce(&v1, &ConfirmStream::Batch(token))
                .unwrap(),
            Nonce::new(1)
        );

        // Ids and nonces keep counting from where they stopped
        restored.fund(&alice, &token, 100);
        let id = restored
            .service
            .send_to_eth(
                &alice,
                EthAddress::new([0xde; 20]),
                erc20(10, token),
                erc20(1, token),
            )
            .unwrap();
        assert_eq!(id, 4);
        let batch = restored.service.build_batch(&token).unwrap();
        assert_eq!(batch.nonce, Nonce::new(2));
    }

    #[test]
    fn test_invalid_genesis_writes_nothing() {
        let mut genesis = busy_bridge().service.export_genesis().unwrap();
        genesis.last_batch_nonce = Nonce::new(0);

        let mut bridge = TestBridge::with_params(BridgeParams::default(), &[]);
        assert!(matches!(
            bridge.service.init_genesis(genesis),
            Err(BridgeError::Invalid(_))
        ));
        assert_eq!(
            bridge.service.export_genesis().unwrap(),
            GenesisState::new(BridgeParams::default())
        );
    }
}
