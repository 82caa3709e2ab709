//! In-memory adapters for the outbound ports.
//!
//! Used by tests and by hosts that keep bridge state in process.

pub mod memory_ledger;
pub mod memory_registry;
pub mod memory_store;
pub mod slashing_sink;

pub use memory_ledger::InMemoryTokenLedger;
pub use memory_registry::InMemoryValidatorRegistry;
pub use memory_store::InMemoryBridgeStore;
pub use slashing_sink::InMemorySlashingSink;
