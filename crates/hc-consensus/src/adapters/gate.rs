//! Bounded-wait exclusive access to the execution environment.

use crate::domain::{ConsensusError, ConsensusResult, ExecutionConfig};
use crate::ports::ExecutionEnvironment;
use parking_lot::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::warn;

/// Default wait for the executor.
pub const DEFAULT_EXECUTION_LOCK_TIMEOUT: Duration = Duration::from_secs(600);

/// Serialises executor access; a waiter gives up after `timeout`.
pub struct ExecutionGate<E: ExecutionEnvironment> {
    executor: Mutex<E>,
    timeout: Duration,
}

impl<E: ExecutionEnvironment> ExecutionGate<E> {
    pub fn new(executor: E) -> Self {
        Self::with_timeout(executor, DEFAULT_EXECUTION_LOCK_TIMEOUT)
    }

    pub fn with_timeout(executor: E, timeout: Duration) -> Self {
        Self {
            executor: Mutex::new(executor),
            timeout,
        }
    }

    pub fn from_config(executor: E, config: &ExecutionConfig) -> Self {
        Self::with_timeout(executor, config.lock_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `f` with exclusive access, or fail with `LockTimeout`.
    pub fn run<R>(&self, f: impl FnOnce(&mut E) -> R) -> ConsensusResult<R> {
        let mut guard = self.acquire()?;
        Ok(f(&mut guard))
    }

    /// Hold the executor directly, e.g. to inspect its state.
    pub fn acquire(&self) -> ConsensusResult<MutexGuard<'_, E>> {
        self.executor.try_lock_for(self.timeout).ok_or_else(|| {
            warn!(
                "[hc-consensus] Execution environment busy for {:?}, aborting import",
                self.timeout
            );
            ConsensusError::LockTimeout {
                waited: self.timeout,
            }
        })
    }
}

impl<E: ExecutionEnvironment> std::fmt::Debug for ExecutionGate<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionGate")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
