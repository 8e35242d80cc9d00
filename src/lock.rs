//! Advisory run locks.
//!
//! Mutual exclusion between producer processes is a marker file created with
//! `create_new`, which is atomic at the filesystem level. A contending
//! writer polls for the marker's absence until a wall-clock deadline, after
//! which the marker is presumed abandoned by a crashed holder and the
//! configured [`StalePolicy`] decides what happens next.
//!
//! The guard removes the marker on every exit path, including error
//! propagation out of the critical section. Only a hard crash between
//! acquisition and drop leaves a marker behind, which is exactly the case
//! the deadline exists to bound.

use crate::error::CatalogError;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// What to do with a marker that has outlived the acquisition deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalePolicy {
    /// Remove the stale marker, then race to retake it with a fresh
    /// deadline. Closes the double-write window of a plain override.
    BreakLock,
    /// Proceed with the critical section without holding the marker. Two
    /// overriding writers can then mutate concurrently; this reproduces the
    /// pipeline's historical behavior and is only safe when last-writer-wins
    /// is acceptable.
    Override,
    /// Give up and surface `LockHeld` to the caller.
    Fail,
}

/// Acquisition parameters for a [`RunLock`].
#[derive(Debug, Clone)]
pub struct LockOptions {
    /// How long a contending writer waits before treating the marker as
    /// abandoned.
    pub deadline: Duration,
    /// Sleep between existence checks while contending.
    pub poll_interval: Duration,
    pub stale_policy: StalePolicy,
}

impl Default for LockOptions {
    fn default() -> Self {
        LockOptions {
            deadline: Duration::from_secs(120),
            poll_interval: Duration::from_millis(50),
            stale_policy: StalePolicy::BreakLock,
        }
    }
}

/// Held advisory lock for one (product, run) pair.
///
/// Dropping the guard deletes the marker. A guard produced by the
/// `Override` policy never owned the marker and leaves it alone.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    held: bool,
}

impl RunLock {
    /// Acquire the marker at `path`, blocking up to the configured deadline
    /// while another writer holds it. Lock contention never propagates as an
    /// error unless the policy is `Fail`.
    pub fn acquire(path: &Path, options: &LockOptions) -> Result<RunLock, CatalogError> {
        let mut attempt_started = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(_) => {
                    return Ok(RunLock {
                        path: path.to_path_buf(),
                        held: true,
                    });
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    if attempt_started.elapsed() < options.deadline {
                        std::thread::sleep(options.poll_interval);
                        continue;
                    }
                    match options.stale_policy {
                        StalePolicy::BreakLock => {
                            warn!(lock = %path.display(), "breaking stale run lock");
                            match fs::remove_file(path) {
                                Ok(()) => {}
                                Err(err) if err.kind() == ErrorKind::NotFound => {}
                                Err(err) => return Err(err.into()),
                            }
                            // Another writer may beat us to the retake; start
                            // a fresh attempt against the new holder.
                            attempt_started = Instant::now();
                        }
                        StalePolicy::Override => {
                            warn!(lock = %path.display(), "overriding stale run lock");
                            return Ok(RunLock {
                                path: path.to_path_buf(),
                                held: false,
                            });
                        }
                        StalePolicy::Fail => {
                            return Err(CatalogError::LockHeld(path.to_path_buf()));
                        }
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Whether this guard actually owns the marker file.
    pub fn is_held(&self) -> bool {
        self.held
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if self.held {
            if let Err(err) = fs::remove_file(&self.path) {
                if err.kind() != ErrorKind::NotFound {
                    warn!(lock = %self.path.display(), error = %err, "failed to remove run lock");
                    return;
                }
            }
            debug!(lock = %self.path.display(), "released run lock");
        }
    }
}
