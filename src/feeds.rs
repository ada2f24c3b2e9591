//! Donation data sources.
//!
//! The dashboard reads paid donations from the Metabase dataset API. When that
//! is unreachable it falls back to a seeded synthetic feed so the aggregates
//! still render.

pub mod fallback;
pub mod metabase;
pub mod mock;
pub mod retry;

use async_trait::async_trait;
use common::{DataOrigin, DonationRecord};
use thiserror::Error;

pub use fallback::FallbackSource;
pub use metabase::MetabaseSource;
pub use mock::MockSource;
pub use retry::RetryingSource;

#[derive(Debug, Error)]
pub enum FeedError {
    /// Source cannot be used with the current configuration
    #[error("Feed not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),

    /// The whole fetch ran past its time budget
    #[error("Timed out after {0:?}")]
    TimedOut(std::time::Duration),
}

impl FeedError {
    /// Whether trying again can possibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::NotConfigured(_) | FeedError::Decode(_) | FeedError::TimedOut(_) => false,
            FeedError::Http(_) => true,
            FeedError::Status { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

/// Something that yields donation records.
#[async_trait]
pub trait DonationSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Result<Vec<DonationRecord>, FeedError>;
}

/// Paid donations together with where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationFeed {
    pub records: Vec<DonationRecord>,
    pub origin: DataOrigin,
}

/// Source that can answer with the origin of its data.
#[async_trait]
pub trait DonationFeedProvider: Send + Sync {
    async fn load(&self) -> DonationFeed;
}
