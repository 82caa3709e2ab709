//! Ports for the bridge core (hexagonal architecture)

pub mod inbound;
pub mod outbound;

pub use inbound::{BridgeApi, BridgeQueries};
pub use outbound::{BridgeStore, SlashingSink, StoreResult, TokenLedger, ValidatorRegistry};
