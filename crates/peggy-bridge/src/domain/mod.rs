//! Domain layer for the bridge core
//!
//! Pure types and rules. Nothing here touches a port.

pub mod attestation;
pub mod batch;
pub mod claims;
pub mod confirm;
pub mod denom;
pub mod genesis;
pub mod params;
pub mod slashing;
pub mod valset;

pub use attestation::{Attestation, AttestationKey, AttestationThreshold, ClaimOutcome, Vote};
pub use batch::{fee_order, BatchStatus, OutgoingTransferTx, OutgoingTxBatch};
pub use claims::{ClaimType, EthereumClaim};
pub use confirm::{BatchConfirm, ConfirmOutcome, ConfirmStream, ValsetConfirm};
pub use denom::voucher_denom;
pub use genesis::{ClaimCursor, ConfirmCursor, EthAddressRegistration, GenesisState};
pub use params::BridgeParams;
pub use slashing::SlashingSignal;
pub use valset::{normalize_power, BridgeValidator, Valset};
