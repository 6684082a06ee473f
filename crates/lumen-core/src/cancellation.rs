#![forbid(unsafe_code)]

//! Cooperative cancellation for background view tasks.
//!
//! Every task started through [`Lifecycle::start_task`] receives a
//! [`CancellationToken`]. The lifecycle keeps the matching
//! [`CancellationSource`] and fires it when the owning view disappears or the
//! task is cancelled explicitly. Tasks poll [`CancellationToken::is_cancelled`]
//! or park in [`CancellationToken::wait_timeout`] between units of work.
//!
//! ```
//! use lumen_core::cancellation::CancellationSource;
//! use std::time::Duration;
//!
//! let source = CancellationSource::new();
//! let token = source.token();
//! let worker = std::thread::spawn(move || {
//!     let mut ticks = 0;
//!     while !token.wait_timeout(Duration::from_millis(5)) {
//!         ticks += 1;
//!     }
//!     ticks
//! });
//! source.cancel();
//! worker.join().unwrap();
//! ```
//!
//! [`Lifecycle::start_task`]: crate::lifecycle::Lifecycle::start_task

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use web_time::{Duration, Instant};

struct Shared {
    cancelled: AtomicBool,
    parked: Mutex<()>,
    wake: Condvar,
}

/// Owner side of a cancellation pair.
///
/// Dropping the source leaves its tokens uncancelled; cancellation is always
/// an explicit call.
pub struct CancellationSource {
    shared: Arc<Shared>,
}

/// Task side of a cancellation pair. Cheap to clone and `Send`.
#[derive(Clone)]
pub struct CancellationToken {
    shared: Arc<Shared>,
}

impl CancellationSource {
    /// Create a source whose tokens start uncancelled.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                cancelled: AtomicBool::new(false),
                parked: Mutex::new(()),
                wake: Condvar::new(),
            }),
        }
    }

    /// Hand out a token observing this source.
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Cancel every token and wake parked waiters.
    ///
    /// Returns `true` on the call that actually flipped the flag.
    pub fn cancel(&self) -> bool {
        let first = !self.shared.cancelled.swap(true, Ordering::AcqRel);
        let _guard = self
            .shared
            .parked
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        self.shared.wake.notify_all();
        first
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    /// Whether the owning source has been cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }

    /// Park until cancelled or until `timeout` elapses.
    ///
    /// Returns `true` when cancelled, `false` on timeout. Tasks use this as a
    /// cancellable sleep between ticks.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        let deadline = Instant::now() + timeout;
        let mut guard = self
            .shared
            .parked
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        loop {
            if self.is_cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (next, _) = self
                .shared
                .wake
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            guard = next;
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl std::fmt::Debug for CancellationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationSource")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
