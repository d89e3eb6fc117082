//! # Hybrid-Chain Test Suite
//!
//! Cross-crate scenarios over the real block index and chain selector.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs        # Header, block and selector builders
//! └── integration/
//!     ├── index_restart.rs   # Flush, restart and integrity on disk
//!     ├── fork_walk.rs       # PreHybrid → Hybrid → SignatureSwap
//!     └── execution.rs       # Rewards, rollback, timeouts, halt
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p hc-tests
//! cargo test -p hc-tests integration::fork_walk
//! RUST_LOG=debug cargo test -p hc-tests -- --nocapture
//!
//! # Benchmarks
//! cargo bench -p hc-tests
//! ```

pub mod fixtures;
pub mod integration;
