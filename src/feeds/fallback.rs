use std::time::Duration;

use async_trait::async_trait;
use common::{DataOrigin, DonationRecord};
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use super::{DonationFeed, DonationFeedProvider, DonationSource, FeedError};

/// Time the primary source gets, retries included, before the fallback is
/// used. Stays well below the HTTP request timeout.
pub const DEFAULT_PRIMARY_BUDGET: Duration = Duration::from_secs(10);

/// Serves the primary source and switches to the secondary one when the
/// primary fails or runs past its budget. Only paid donations are passed on.
pub struct FallbackSource<P, F> {
    primary: P,
    fallback: F,
    primary_budget: Duration,
}

impl<P: DonationSource, F: DonationSource> FallbackSource<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback,
            primary_budget: DEFAULT_PRIMARY_BUDGET,
        }
    }

    pub fn with_budget(mut self, primary_budget: Duration) -> Self {
        self.primary_budget = primary_budget;
        self
    }

    async fn fetch_primary(&self) -> Result<Vec<DonationRecord>, FeedError> {
        timeout(self.primary_budget, self.primary.fetch())
            .await
            .unwrap_or(Err(FeedError::TimedOut(self.primary_budget)))
    }
}

#[async_trait]
impl<P: DonationSource, F: DonationSource> DonationFeedProvider for FallbackSource<P, F> {
    #[instrument(skip(self), fields(primary = self.primary.name(), fallback = self.fallback.name()))]
    async fn load(&self) -> DonationFeed {
        match self.fetch_primary().await {
            Ok(records) => {
                info!("Loaded {} donations from {}", records.len(), self.primary.name());
                DonationFeed {
                    records: paid_only(records),
                    origin: DataOrigin::Live,
                }
            }
            Err(e) => {
                warn!(
                    "Primary donation source {} failed ({}), falling back to {}",
                    self.primary.name(),
                    e,
                    self.fallback.name()
                );
                let records = match self.fallback.fetch().await {
                    Ok(records) => records,
                    Err(e) => {
                        warn!("Fallback donation source failed as well: {}", e);
                        Vec::new()
                    }
                };
                DonationFeed {
                    records: paid_only(records),
                    origin: DataOrigin::Mock,
                }
            }
        }
    }
}

fn paid_only(records: Vec<DonationRecord>) -> Vec<DonationRecord> {
    records.into_iter().filter(DonationRecord::is_paid).collect()
}
