//! Observer trait for workflow events.
//!
//! Inject an [`Arc<dyn WorkflowObserver>`] via
//! [`crate::workflow::Workflow::with_observer`] to hear about uploads,
//! submissions and resets as they happen. The CLI uses it to drive its
//! spinner; a GUI would use it to schedule a repaint.
//!
//! # Example
//!
//! ```rust
//! use aethercanvas::WorkflowObserver;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingObserver {
//!     completed: AtomicUsize,
//! }
//!
//! impl WorkflowObserver for CountingObserver {
//!     fn on_submit_complete(&self, _sequence: u64, _media_type: &str, _payload_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//! ```

use std::sync::Arc;

/// Called by [`crate::workflow::Workflow`] as state changes.
///
/// All methods default to no-ops so implementations only override what they
/// care about. Callbacks run while no workflow lock is held, so they may read
/// [`crate::workflow::Workflow::state`] freely.
pub trait WorkflowObserver: Send + Sync {
    /// A new source image replaced the previous one.
    fn on_upload(&self, display_name: &str, media_type: &str, payload_len: usize) {
        let _ = (display_name, media_type, payload_len);
    }

    /// A submission was accepted and the remote call is about to start.
    ///
    /// # Arguments
    /// * `sequence`: monotonically increasing submission number
    /// * `display_name`: name of the image being submitted
    fn on_submit_start(&self, sequence: u64, display_name: &str) {
        let _ = (sequence, display_name);
    }

    /// The remote call returned an image and it was applied.
    fn on_submit_complete(&self, sequence: u64, media_type: &str, payload_len: usize) {
        let _ = (sequence, media_type, payload_len);
    }

    /// The submission failed; `error` is the message now in `last_error`.
    fn on_submit_error(&self, sequence: u64, error: &str) {
        let _ = (sequence, error);
    }

    /// A reset or re-upload happened while the call was in flight, so its
    /// outcome was dropped.
    fn on_stale_discarded(&self, sequence: u64) {
        let _ = sequence;
    }

    /// The workflow returned to idle.
    fn on_reset(&self) {}
}

/// Observer that ignores every event. Used when none is configured.
pub struct NoopObserver;

impl WorkflowObserver for NoopObserver {}

/// Convenience alias for the type stored in the workflow.
pub type Observer = Arc<dyn WorkflowObserver>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingObserver {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        resets: AtomicUsize,
    }

    impl WorkflowObserver for TrackingObserver {
        fn on_submit_start(&self, _sequence: u64, _display_name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_submit_complete(&self, _sequence: u64, _media_type: &str, _payload_len: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_submit_error(&self, _sequence: u64, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_reset(&self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_observer_does_not_panic() {
        let obs = NoopObserver;
        obs.on_upload("a.png", "image/png", 12);
        obs.on_submit_start(1, "a.png");
        obs.on_submit_complete(1, "image/png", 4);
        obs.on_submit_error(2, "boom");
        obs.on_stale_discarded(3);
        obs.on_reset();
    }

    #[test]
    fn tracking_observer_receives_events() {
        let tracker = TrackingObserver::default();
        tracker.on_submit_start(1, "a.png");
        tracker.on_submit_complete(1, "image/png", 4);
        tracker.on_submit_start(2, "a.png");
        tracker.on_submit_error(2, "Failed to process image. boom");
        tracker.on_reset();

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.resets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_observer_works() {
        let obs: Observer = Arc::new(NoopObserver);
        obs.on_submit_start(1, "x.png");
    }
}
