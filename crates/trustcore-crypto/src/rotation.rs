//! Single-flight guard for background rotation.
//!
//! Reads that notice an expired key or certificate call
//! [`RotationGuard::try_acquire`]; only the first caller gets a permit and
//! spawns the rotation. The permit is released when dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::error;

/// Collapses concurrent rotation triggers into one in-flight rotation.
#[derive(Debug, Default)]
pub struct RotationGuard {
    in_flight: AtomicBool,
}

impl RotationGuard {
    /// Creates a guard with no rotation in flight.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claims the right to rotate. Returns `None` if a rotation is already running.
    pub fn try_acquire(self: &Arc<Self>) -> Option<RotationPermit> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RotationPermit {
                guard: Arc::clone(self),
            })
    }

    /// Whether a rotation currently holds the permit.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Proof of an in-flight rotation. Dropping it lets the next trigger through.
#[derive(Debug)]
pub struct RotationPermit {
    guard: Arc<RotationGuard>,
}

impl Drop for RotationPermit {
    fn drop(&mut self) {
        self.guard.in_flight.store(false, Ordering::Release);
    }
}

/// Runs blocking rotation work off the calling thread without waiting for it.
///
/// Uses the ambient tokio runtime's blocking pool when there is one, and a
/// dedicated OS thread otherwise.
pub fn spawn_detached<F>(name: &'static str, work: F)
where
    F: FnOnce() + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(work);
        }
        Err(_) => {
            if let Err(e) = std::thread::Builder::new().name(name.to_string()).spawn(work) {
                error!(task = name, error = %e, "Failed to spawn rotation thread");
            }
        }
    }
}
