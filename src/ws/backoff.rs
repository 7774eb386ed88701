//! Reconnect delay policy and the single cancellable reconnect timer.

use std::pin::Pin;
use std::time::Duration;

use tokio::time::Sleep;

/// Exponential reconnect backoff: `min(base * 2^attempt, max)`.
///
/// No jitter: one dashboard holds one channel, so there is no herd to spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Unexpected closes tolerated before the manager gives up with `Error`.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Whether attempt number `attempt` may still be scheduled.
    pub fn allows(&self, attempt: u32) -> bool {
        attempt <= self.max_attempts
    }
}

/// At most one pending reconnect.
///
/// Scheduling replaces the previous deadline and cancelling drops it, so a
/// stale timer can never fire after a manual disconnect.
#[derive(Debug, Default)]
pub struct ReconnectTimer {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ReconnectTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, delay: Duration) {
        self.sleep = Some(Box::pin(tokio::time::sleep(delay)));
    }

    /// Cancel the pending reconnect. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.sleep.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.sleep.is_some()
    }

    /// Resolves when the scheduled deadline passes; never resolves when idle.
    ///
    /// Cancel-safe: dropping the future before it completes keeps the deadline.
    pub async fn fired(&mut self) {
        match self.sleep.as_mut() {
            Some(sleep) => {
                sleep.as_mut().await;
                self.sleep = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn policy() -> ReconnectPolicy {
        ReconnectPolicy {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            max_attempts: 3,
        }
    }

    fn assert_within_tick(actual: Duration, expected: Duration) {
        assert!(actual >= expected && actual <= expected + Duration::from_millis(1));
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let p = policy();
        assert_eq!(p.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(p.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(p.delay_for_attempt(3), Duration::from_millis(800));
    }

    #[test]
    fn test_delay_is_capped() {
        let p = policy();
        assert_eq!(p.delay_for_attempt(6), Duration::from_secs(5));
        assert_eq!(p.delay_for_attempt(40), Duration::from_secs(5));
        assert_eq!(p.delay_for_attempt(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn test_allows_up_to_max_attempts() {
        let p = policy();
        assert!(p.allows(3));
        assert!(!p.allows(4));
    }

    #[test]
    fn test_default_policy() {
        let p = ReconnectPolicy::default();
        assert_eq!(p.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(p.max_attempts, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let mut timer = ReconnectTimer::new();
        let start = Instant::now();
        timer.schedule(Duration::from_millis(300));
        assert!(timer.is_pending());

        timer.fired().await;
        assert_within_tick(start.elapsed(), Duration::from_millis(300));
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_deadline() {
        let mut timer = ReconnectTimer::new();
        let start = Instant::now();
        timer.schedule(Duration::from_millis(100));
        timer.schedule(Duration::from_millis(700));

        timer.fired().await;
        assert_within_tick(start.elapsed(), Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let mut timer = ReconnectTimer::new();
        timer.schedule(Duration::from_millis(100));
        assert!(timer.cancel());
        assert!(!timer.cancel());

        let waited = tokio::time::timeout(Duration::from_secs(60), timer.fired()).await;
        assert!(waited.is_err());
    }
}
