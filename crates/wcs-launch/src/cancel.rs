//! One-shot cancellation token shared between a canceller and the
//! cancellation-polling worker.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wcs_core::constants::CANCEL_POLL_INTERVAL;

/// Cloneable handle over a single monotonic flag. `cancel` is idempotent
/// and never cleared.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that is already cancelled, for preemptive requests.
    pub fn cancelled() -> Self {
        let token = Self::new();
        token.cancel();
        token
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Sleep for `duration`, polling the flag every 50 ms. Returns `false`
    /// if cancellation fired before the wait completed.
    pub fn wait_for(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            if remaining.is_zero() {
                return true;
            }
            let slice = remaining.min(CANCEL_POLL_INTERVAL);
            std::thread::sleep(slice);
            remaining -= slice;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn cancel_is_idempotent_and_visible_to_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        assert!(clone.is_cancelled());
    }

    #[test]
    fn wait_for_completes_when_not_cancelled() {
        let token = CancelToken::new();
        assert!(token.wait_for(Duration::from_millis(20)));
    }

    #[test]
    fn wait_for_returns_early_on_cancel() {
        let token = CancelToken::new();
        let waiter = token.clone();
        let handle = std::thread::spawn(move || {
            let start = Instant::now();
            let completed = waiter.wait_for(Duration::from_secs(5));
            (completed, start.elapsed())
        });

        std::thread::sleep(Duration::from_millis(30));
        token.cancel();

        let (completed, elapsed) = handle.join().unwrap();
        assert!(!completed);
        assert!(elapsed < Duration::from_millis(500), "took {elapsed:?}");
    }
}
