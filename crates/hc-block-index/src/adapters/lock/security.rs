//! # Lock Security
//!
//! Stale-lock detection for crashed owners.

use std::path::Path;
use std::time::Duration;

/// How long `DatabaseLock::acquire` waits for a held lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Lock files older than this are treated as left behind by a crash.
pub const MAX_LOCK_AGE: Duration = Duration::from_secs(86400);

/// Whether a process with `pid` is alive.
pub fn is_process_running(pid: u32) -> bool {
    #[cfg(unix)]
    {
        Path::new(&format!("/proc/{}", pid)).exists()
    }

    #[cfg(not(unix))]
    {
        let _ = pid;
        true
    }
}

/// Lock file must resolve inside the data directory.
pub fn validate_lock_path(data_dir: &Path, lock_path: &Path) -> bool {
    match (lock_path.canonicalize(), data_dir.canonicalize()) {
        (Ok(lock), Ok(dir)) => lock.starts_with(dir),
        _ => false,
    }
}

/// Lock file modification time is older than `max_age`.
pub fn is_lock_stale(lock_path: &Path, max_age: Duration) -> bool {
    lock_path
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|t| t.elapsed().ok())
        .map(|age| age > max_age)
        .unwrap_or(false)
}
