//! # Bridge Metrics
//!
//! Prometheus counters for the attestation oracle and the confirmation
//! streams.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! peggy-bridge = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `peggy_claims_submitted_total` - Claims processed, by outcome
//! - `peggy_claims_rejected_total` - Claims rejected, by reason
//! - `peggy_attestations_finalized_total` - Finalized attestations, by claim type
//! - `peggy_equivocations_total` - Equivocating claims detected
//! - `peggy_confirmations_total` - Stored confirmations, by stream
//! - `peggy_batches_built_total` - Batches built

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref CLAIMS_SUBMITTED: IntCounterVec = register_int_counter_vec!(
        "peggy_claims_submitted_total",
        "Claims processed, labeled by outcome",
        &["outcome"]
    )
    .expect("Failed to create CLAIMS_SUBMITTED metric");

    pub static ref CLAIMS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "peggy_claims_rejected_total",
        "Claims rejected, labeled by reason",
        &["reason"]
    )
    .expect("Failed to create CLAIMS_REJECTED metric");

    pub static ref ATTESTATIONS_FINALIZED: IntCounterVec = register_int_counter_vec!(
        "peggy_attestations_finalized_total",
        "Finalized attestations, labeled by claim type",
        &["claim_type"]
    )
    .expect("Failed to create ATTESTATIONS_FINALIZED metric");

    pub static ref EQUIVOCATIONS: IntCounter = register_int_counter!(
        "peggy_equivocations_total",
        "Equivocating claims detected"
    )
    .expect("Failed to create EQUIVOCATIONS metric");

    pub static ref CONFIRMATIONS: IntCounterVec = register_int_counter_vec!(
        "peggy_confirmations_total",
        "Stored confirmations, labeled by stream",
        &["stream"]
    )
    .expect("Failed to create CONFIRMATIONS metric");

    pub static ref BATCHES_BUILT: IntCounter = register_int_counter!(
        "peggy_batches_built_total",
        "Batches built"
    )
    .expect("Failed to create BATCHES_BUILT metric");
}

#[cfg(feature = "metrics")]
pub fn record_claim(outcome: &str) {
    CLAIMS_SUBMITTED.with_label_values(&[outcome]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_claim_rejected(reason: &str) {
    CLAIMS_REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_attestation_finalized(claim_type: &str) {
    ATTESTATIONS_FINALIZED.with_label_values(&[claim_type]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_equivocation() {
    EQUIVOCATIONS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_confirmation(stream: &str) {
    CONFIRMATIONS.with_label_values(&[stream]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_batch_built() {
    BATCHES_BUILT.inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_claim(_outcome: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_claim_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_attestation_finalized(_claim_type: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_equivocation() {}

#[cfg(not(feature = "metrics"))]
pub fn record_confirmation(_stream: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_batch_built() {}
