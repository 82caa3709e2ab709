//! # peggy-bridge
//!
//! Consensus core of a Cosmos <-> Ethereum bridge.
//!
//! ## Overview
//!
//! Bonded validators, through delegated orchestrator keys, agree on:
//! - **Ethereum events**: deposits, executed batches and executed valset
//!   updates, tallied as attestations and applied once a strict
//!   supermajority of bonded power agrees
//! - **Validator sets**: snapshots of the bonded set, power normalised to the
//!   contract's 2^32 scale, each with a contract-compatible checkpoint
//! - **Outgoing batches**: fee-ordered withdrawals for one token contract,
//!   each with its own checkpoint
//!
//! Orchestrators sign checkpoints with their registered Ethereum key; the
//! contract verifies the same signatures.
//!
//! ## Architecture
//!
//! ```text
//! Host chain ──claims / confirms / msgs──→ BridgeService
//!                                              │
//!                                              ├── BridgeStore        (persisted state)
//!                                              ├── ValidatorRegistry  (bonded power)
//!                                              ├── TokenLedger        (mint / burn vouchers)
//!                                              └── SlashingSink       (equivocation, missed windows)
//! ```
//!
//! ## Claim Streams
//!
//! | Claim | Side effect on finalization |
//! |-------|-----------------------------|
//! | Deposit | Mint vouchers to the receiver |
//! | WithdrawalBatchExecuted | Archive the batch, cancel older pending batches |
//! | ValsetUpdateExecuted | Mark the valset observed, prune older ones |
//!
//! Each claim type has its own nonce stream; only the next nonce is admitted.
//!
//! ## Example
//!
//! ```rust,ignore
//! use peggy_bridge::adapters::*;
//! use peggy_bridge::{BridgeApi, BridgeParams, BridgeService};
//!
//! let mut service = BridgeService::new(
//!     BridgeParams::from_env(),
//!     Arc::new(InMemoryBridgeStore::new()),
//!     registry,
//!     ledger,
//!     Arc::new(InMemorySlashingSink::new()),
//! )?;
//!
//! let outcome = service.submit_claim(&orchestrator, claim)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::{
    voucher_denom, Attestation, AttestationKey, AttestationThreshold, BatchConfirm, BatchStatus,
    BridgeParams, BridgeValidator, ClaimOutcome, ClaimType, ConfirmOutcome, ConfirmStream,
    EthereumClaim, GenesisState, OutgoingTransferTx, OutgoingTxBatch, SlashingSignal, Valset,
    ValsetConfirm, Vote,
};
pub use error::{BridgeError, BridgeResult, StoreError};
pub use ports::{BridgeApi, BridgeQueries, BridgeStore, SlashingSink, TokenLedger, ValidatorRegistry};
pub use service::BridgeService;
