//! Cross-crate scenarios.

mod deposits;
mod genesis;
mod valsets;
mod withdrawals;
