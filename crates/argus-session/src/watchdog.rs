//! Analysis watchdog: bounds how long a deep-analysis pass may stay "in
//! progress" before the session force-resets it.

use std::time::Duration;
use tokio::time::Instant;

/// Deep analysis that has not produced a result within this bound is
/// treated as lost. Design parameter, not per-request tuning.
pub const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(60);

/// At most one outstanding deadline; re-arming replaces any prior one.
#[derive(Debug, Default)]
pub struct AnalysisWatchdog {
    deadline: Option<Instant>,
}

impl AnalysisWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) the timer, cancelling any pending deadline.
    pub fn arm(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rearm_replaces_deadline() {
        let mut watchdog = AnalysisWatchdog::new();
        let first = Instant::now() + Duration::from_secs(10);
        let second = Instant::now() + Duration::from_secs(60);
        watchdog.arm(first);
        watchdog.arm(second);
        assert_eq!(watchdog.deadline(), Some(second));
    }

    #[test]
    fn test_disarm_clears() {
        let mut watchdog = AnalysisWatchdog::new();
        watchdog.arm(Instant::now());
        watchdog.disarm();
        assert!(!watchdog.is_armed());
    }
}
