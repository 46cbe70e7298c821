use crate::lightx::retry::Backoff;
use std::time::Duration;

/// Bounded status polling: at most `max_attempts` queries, with `backoff`
/// applied between consecutive queries only.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for PollPolicy {
    fn default() -> Self {
        PollPolicy {
            max_attempts: 5,
            backoff: Backoff::Fixed(Duration::from_secs(3)),
        }
    }
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        PollPolicy {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Fixed(interval),
        }
    }

    /// Delay to wait after `attempt` (1-based), or `None` once the budget is spent.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then(|| self.backoff.delay(attempt))
    }
}
