//! # Chain Selection Metrics
//!
//! Prometheus metrics for block import.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! hc-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `chain_blocks_imported_total{result}` - Import outcomes
//! - `chain_reorgs_total` - Canonical head switches to another branch
//! - `chain_import_latency_seconds` - Histogram of `try_connect` times

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Import outcomes, labeled by result
    pub static ref BLOCKS_IMPORTED: IntCounterVec = register_int_counter_vec!(
        "chain_blocks_imported_total",
        "Total number of import attempts by outcome",
        &["result"]
    )
    .expect("Failed to create BLOCKS_IMPORTED metric");

    /// Reorganisations onto a different branch
    pub static ref REORGS: IntCounter = register_int_counter!(
        "chain_reorgs_total",
        "Total number of chain reorganisations"
    )
    .expect("Failed to create REORGS metric");

    /// Histogram of import latency
    pub static ref IMPORT_LATENCY: Histogram = register_histogram!(
        "chain_import_latency_seconds",
        "Time taken to import a block in seconds",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to create IMPORT_LATENCY metric");
}

/// Record an import outcome
#[cfg(feature = "metrics")]
pub fn record_import(result: &str) {
    BLOCKS_IMPORTED.with_label_values(&[result]).inc();
}

/// Record a reorganisation
#[cfg(feature = "metrics")]
pub fn record_reorg() {
    REORGS.inc();
}

/// Record import latency
#[cfg(feature = "metrics")]
pub fn record_import_latency(seconds: f64) {
    IMPORT_LATENCY.observe(seconds);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_import(_result: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_reorg() {}

#[cfg(not(feature = "metrics"))]
pub fn record_import_latency(_seconds: f64) {}
