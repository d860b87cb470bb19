//! Requests-per-minute limiting for LLM calls

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;

/// Caps how many LLM requests an agent (or a whole crew) makes per minute
///
/// Clones share the same budget. A controller built from `None` or `0`
/// never waits.
#[derive(Clone, Default)]
pub struct RpmController {
    limiter: Option<Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>>,
    max_rpm: Option<u32>,
}

impl RpmController {
    /// Create a controller; `None` means unlimited
    pub fn new(max_rpm: Option<u32>) -> Self {
        match max_rpm.and_then(NonZeroU32::new) {
            Some(rpm) => Self {
                limiter: Some(Arc::new(RateLimiter::direct(Quota::per_minute(rpm)))),
                max_rpm: Some(rpm.get()),
            },
            None => Self::unlimited(),
        }
    }

    /// A controller that never waits
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Configured limit, if any
    pub fn max_rpm(&self) -> Option<u32> {
        self.max_rpm
    }

    /// Wait until one more request fits in the budget
    pub async fn acquire(&self) {
        if let Some(limiter) = &self.limiter {
            if limiter.check().is_err() {
                debug!(max_rpm = ?self.max_rpm, "RPM limit reached, waiting for next minute");
                limiter.until_ready().await;
            }
        }
    }
}

impl std::fmt::Debug for RpmController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpmController")
            .field("max_rpm", &self.max_rpm)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_zero_means_unlimited() {
        assert_eq!(RpmController::new(Some(0)).max_rpm(), None);
        assert_eq!(RpmController::new(None).max_rpm(), None);
        assert_eq!(RpmController::new(Some(15)).max_rpm(), Some(15));
    }

    #[tokio::test]
    async fn test_unlimited_never_waits() {
        let rpm = RpmController::unlimited();
        let all = async {
            for _ in 0..1000 {
                rpm.acquire().await;
            }
        };
        tokio::time::timeout(Duration::from_secs(1), all)
            .await
            .expect("unlimited controller should not block");
    }

    #[tokio::test]
    async fn test_burst_within_quota_does_not_wait() {
        let rpm = RpmController::new(Some(3));
        let shared = rpm.clone();
        let burst = async {
            rpm.acquire().await;
            shared.acquire().await;
            rpm.acquire().await;
        };
        tokio::time::timeout(Duration::from_secs(1), burst)
            .await
            .expect("three requests fit in a 3 rpm budget");
    }

    #[tokio::test]
    async fn test_clones_share_budget() {
        let rpm = RpmController::new(Some(1));
        rpm.acquire().await;
        let blocked = tokio::time::timeout(Duration::from_millis(50), rpm.clone().acquire()).await;
        assert!(blocked.is_err());
    }
}
