//! # Bridge Benchmarks
//!
//! Hot paths an orchestrator and the chain hit on every confirmation:
//! checkpoint hashing, signature recovery and the claim tally.
//!
//! ## Usage
//!
//! ```bash
//! cargo bench --package peggy-tests --bench bridge_benchmarks
//! cargo bench --package peggy-tests --bench bridge_benchmarks -- checkpoint
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use peggy_bridge::adapters::{
    InMemoryBridgeStore, InMemorySlashingSink, InMemoryTokenLedger, InMemoryValidatorRegistry,
};
use peggy_bridge::domain::{BridgeValidator, OutgoingTransferTx, OutgoingTxBatch, Valset};
use peggy_bridge::{BridgeApi, BridgeParams, BridgeService, EthereumClaim};
use peggy_crypto::{address_from_pubkey, recover_signer, sign_eth_message, SigningKey};
use peggy_types::{AccountAddress, Erc20Token, EthAddress, Nonce, ValidatorAddress};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

const PEGGY_ID: &str = "defaultpeggyid";

fn random_address(rng: &mut impl Rng) -> EthAddress {
    EthAddress::new(rng.gen())
}

fn random_valset(members: usize) -> Valset {
    let mut rng = rand::thread_rng();
    let power = u64::from(u32::MAX) / members as u64;
    let members = (0..members)
        .map(|_| BridgeValidator::new(power, random_address(&mut rng)))
        .collect();
    // Valset::new only fails on empty or invalid members
    Valset::new(Nonce::new(1), members).unwrap()
}

fn random_batch(elements: usize) -> OutgoingTxBatch {
    let mut rng = rand::thread_rng();
    let token = EthAddress::new([0x7c; 20]);
    let txs = (0..elements)
        .map(|i| OutgoingTransferTx {
            id: i as u64 + 1,
            sender: AccountAddress::new([0xa1; 20]),
            dest: random_address(&mut rng),
            amount: Erc20Token::new(rng.gen_range(1u64..1_000_000), "MAX", token),
            bridge_fee: Erc20Token::new(rng.gen_range(0u64..100), "MAX", token),
        })
        .collect();
    OutgoingTxBatch::new(Nonce::new(1), token, txs, [0u8; 32]).unwrap()
}

fn bench_checkpoints(c: &mut Criterion) {
    let mut group = c.benchmark_group("checkpoint");
    for size in [1usize, 10, 100] {
        let valset = random_valset(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("valset", size), &valset, |b, v| {
            b.iter(|| black_box(v.checkpoint(PEGGY_ID).unwrap()))
        });

        let batch = random_batch(size);
        group.bench_with_input(BenchmarkId::new("batch", size), &batch, |b, batch| {
            b.iter(|| black_box(batch.checkpoint(PEGGY_ID).unwrap()))
        });
    }
    group.finish();
}

fn bench_signatures(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature");
    let key = SigningKey::from_slice(&[0x42; 32]).unwrap();
    let address = address_from_pubkey(key.verifying_key());
    let checkpoint = random_valset(100).checkpoint(PEGGY_ID).unwrap();
    let signature = sign_eth_message(&checkpoint, Some(&key)).unwrap();

    group.bench_function("sign", |b| {
        b.iter(|| black_box(sign_eth_message(&checkpoint, Some(&key)).unwrap()))
    });
    group.bench_function("recover", |b| {
        b.iter(|| {
            let signer = recover_signer(&checkpoint, signature.as_bytes()).unwrap();
            assert_eq!(signer, address);
        })
    });
    group.finish();
}

/// Every bonded validator votes on the same deposit.
fn bench_claim_tally(c: &mut Criterion) {
    let mut group = c.benchmark_group("tally");
    group.measurement_time(Duration::from_secs(5));

    for validators in [4usize, 32, 128] {
        group.throughput(Throughput::Elements(validators as u64));
        group.bench_function(BenchmarkId::new("deposit_round", validators), |b| {
            b.iter_with_setup(
                || {
                    let registry = Arc::new(InMemoryValidatorRegistry::new());
                    let accounts: Vec<AccountAddress> = (0..validators)
                        .map(|i| {
                            let mut raw = [0u8; 20];
                            raw[..4].copy_from_slice(&(i as u32).to_be_bytes());
                            let validator = ValidatorAddress::new(raw);
                            raw[19] = 0xac;
                            let account = AccountAddress::new(raw);
                            registry.bond(validator, 10, account).unwrap();
                            account
                        })
                        .collect();
                    let service = BridgeService::new(
                        BridgeParams::default(),
                        Arc::new(InMemoryBridgeStore::new()),
                        registry,
                        Arc::new(InMemoryTokenLedger::new()),
                        Arc::new(InMemorySlashingSink::new()),
                    )
                    .unwrap();
                    (service, accounts)
                },
                |(mut service, accounts)| {
                    let claim = EthereumClaim::Deposit {
                        nonce: Nonce::new(1),
                        token: Erc20Token::new(100u64, "MAX", EthAddress::new([0x7c; 20])),
                        eth_sender: EthAddress::new([0xee; 20]),
                        cosmos_receiver: AccountAddress::new([0xa1; 20]),
                    };
                    for account in &accounts {
                        black_box(service.submit_claim(account, claim.clone()).unwrap());
                    }
                },
            )
        });
    }
    group.finish();
}

criterion_group!(
    name = bridge_benches;
    config = Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(5));
    targets = bench_checkpoints, bench_signatures, bench_claim_tally
);

criterion_main!(bridge_benches);
