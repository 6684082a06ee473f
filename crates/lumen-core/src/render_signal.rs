#![forbid(unsafe_code)]

//! "Needs render" signalling between background work and the render loop.
//!
//! A [`channel`] yields a cloneable [`RenderRequester`] for producers and a
//! single [`RenderRequests`] receiver for the loop. Requests coalesce: any
//! number of calls between two frames amounts to one pending render.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use web_time::Duration;

/// Create a connected requester/receiver pair.
pub fn channel() -> (RenderRequester, RenderRequests) {
    let (tx, rx) = mpsc::channel();
    let pending = Arc::new(AtomicBool::new(false));
    (
        RenderRequester {
            tx,
            pending: Arc::clone(&pending),
        },
        RenderRequests { rx, pending },
    )
}

/// Producer handle. `Send + Clone`; hand one to every task.
#[derive(Clone, Debug)]
pub struct RenderRequester {
    tx: mpsc::Sender<()>,
    pending: Arc<AtomicBool>,
}

impl RenderRequester {
    /// Ask for a frame.
    ///
    /// Returns `false` when the receiving side is gone.
    pub fn request_render(&self) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return true;
        }
        self.tx.send(()).is_ok()
    }
}

/// Receiver held by the render loop.
#[derive(Debug)]
pub struct RenderRequests {
    rx: mpsc::Receiver<()>,
    pending: Arc<AtomicBool>,
}

impl RenderRequests {
    /// Consume the pending request, if any, without blocking.
    pub fn take_pending(&self) -> bool {
        while self.rx.try_recv().is_ok() {}
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Block up to `timeout` for a request, then consume it.
    ///
    /// Returns `true` when a render was requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.take_pending() {
            return true;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(()) => {
                self.take_pending();
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_coalesce() {
        let (requester, requests) = channel();
        assert!(!requests.take_pending());
        requester.request_render();
        requester.clone().request_render();
        assert!(requests.take_pending());
        assert!(!requests.take_pending());
    }

    #[test]
    fn wait_timeout_sees_request_from_other_thread() {
        let (requester, requests) = channel();
        let handle = std::thread::spawn(move || requester.request_render());
        assert!(requests.wait_timeout(Duration::from_secs(5)));
        assert!(handle.join().unwrap());
    }

    #[test]
    fn wait_timeout_without_request() {
        let (_requester, requests) = channel();
        assert!(!requests.wait_timeout(Duration::from_millis(5)));
    }

    #[test]
    fn requester_reports_dropped_receiver() {
        let (requester, requests) = channel();
        drop(requests);
        assert!(!requester.request_render());
    }
}
