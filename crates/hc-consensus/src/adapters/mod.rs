//! Adapters layer
//!
//! - `gate`: timed exclusive access to an `ExecutionEnvironment`
//! - `executor`: in-memory ledger executor

mod executor;
mod gate;

pub use executor::{InMemoryExecutor, TRANSFER_ENERGY};
pub use gate::{ExecutionGate, DEFAULT_EXECUTION_LOCK_TIMEOUT};
