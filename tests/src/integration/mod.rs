//! # Integration Scenarios
//!
//! Each module drives the public APIs of `hc-block-index` and
//! `hc-consensus` together, the way a node would.

mod execution;
mod fork_walk;
mod index_restart;
