use std::time::Duration;

use async_trait::async_trait;
use common::DonationRecord;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use super::{DonationSource, FeedError};

/// Wraps a source with bounded exponential backoff.
///
/// Attempt `n` (zero based) that fails with a retryable error waits
/// `min(base_delay * 2^n, max_delay)` before trying again, up to
/// `max_retries` additional attempts.
pub struct RetryingSource<S> {
    inner: S,
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl<S: DonationSource> RetryingSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }

    pub fn with_policy(inner: S, max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay,
        }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[async_trait]
impl<S: DonationSource> DonationSource for RetryingSource<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    #[instrument(skip(self), fields(source = self.inner.name()))]
    async fn fetch(&self) -> Result<Vec<DonationRecord>, FeedError> {
        let mut attempt = 0;
        loop {
            match self.inner.fetch().await {
                Ok(records) => return Ok(records),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let wait = self.delay_for(attempt);
                    warn!("Fetch attempt {} failed: {}; retrying in {:?}", attempt + 1, e, wait);
                    sleep(wait).await;
                    attempt += 1;
                }
                Err(e) => {
                    debug!("Giving up after {} attempts", attempt + 1);
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    struct FlakySource {
        failures_before_success: u32,
        calls: AtomicU32,
        error: fn() -> FeedError,
    }

    impl FlakySource {
        fn new(failures_before_success: u32, error: fn() -> FeedError) -> Self {
            Self {
                failures_before_success,
                calls: AtomicU32::new(0),
                error,
            }
        }
    }

    #[async_trait]
    impl DonationSource for FlakySource {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn fetch(&self) -> Result<Vec<DonationRecord>, FeedError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                Err((self.error)())
            } else {
                let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
                Ok(vec![DonationRecord::new(at, 100.0, 3.2)])
            }
        }
    }

    fn server_error() -> FeedError {
        FeedError::Status {
            status: 503,
            body: String::new(),
        }
    }

    fn not_configured() -> FeedError {
        FeedError::NotConfigured("missing key".to_string())
    }

    #[test]
    fn test_delay_schedule_is_capped() {
        let source = RetryingSource::new(FlakySource::new(0, server_error));

        assert_eq!(source.delay_for(0), Duration::from_secs(1));
        assert_eq!(source.delay_for(1), Duration::from_secs(2));
        assert_eq!(source.delay_for(4), Duration::from_secs(16));
        assert_eq!(source.delay_for(5), Duration::from_secs(30));
        assert_eq!(source.delay_for(40), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let source = RetryingSource::new(FlakySource::new(2, server_error));
        let start = Instant::now();

        let records = source.fetch().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let source = RetryingSource::new(FlakySource::new(u32::MAX, server_error));

        let result = source.fetch().await;

        assert!(matches!(result, Err(FeedError::Status { status: 503, .. })));
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_does_not_retry_configuration_errors() {
        let source = RetryingSource::new(FlakySource::new(u32::MAX, not_configured));

        let result = source.fetch().await;

        assert!(matches!(result, Err(FeedError::NotConfigured(_))));
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 1);
    }
}
