//! Deadline and cancellation for a running scan.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Stops a scan between entities once a deadline passes or the shared flag
/// is raised.
///
/// Clones share the cancellation flag, so a clone handed to another thread
/// (or a Ctrl-C handler) can cancel a scan in progress.
#[derive(Debug, Clone, Default)]
pub struct ScanControl {
    deadline: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl ScanControl {
    /// No deadline, not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The flag that cancels scans using this control.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Whether the scan should stop before its next entity.
    pub fn should_stop(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_control_runs() {
        let control = ScanControl::new();
        assert!(!control.should_stop());
        assert!(control.deadline().is_none());
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let control = ScanControl::new();
        let clone = control.clone();
        clone.cancel();
        assert!(control.is_cancelled());
        assert!(control.should_stop());
    }

    #[test]
    fn cancel_flag_can_be_raised_externally() {
        let control = ScanControl::new();
        control.cancel_flag().store(true, Ordering::Relaxed);
        assert!(control.should_stop());
    }

    #[test]
    fn past_deadline_stops() {
        let control = ScanControl::new().with_deadline(Instant::now());
        assert!(control.should_stop());

        let control = ScanControl::new().with_timeout(Duration::from_secs(3600));
        assert!(!control.should_stop());
    }
}
