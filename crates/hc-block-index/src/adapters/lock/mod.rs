//! # Database Process Locking
//!
//! Ensures a single process owns a persisted index directory.
//!
//! ## Modules
//!
//! - `flock`: `DatabaseLock` on top of fs2 advisory locks
//! - `security`: stale-lock detection and path validation

mod flock;
mod security;

pub use flock::{DatabaseLock, LockError};
pub use security::DEFAULT_LOCK_TIMEOUT;
