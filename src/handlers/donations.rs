use axum::{extract::State, http::StatusCode, response::Json};
use common::{DonationSummaryResponse, MonthlyDonationsResponse};
use compute::{aggregate_by_month, summarize};
use tracing::{debug, info, instrument, trace};

use crate::feeds::DonationFeed;
use crate::schemas::{ApiResponse, AppState, CachedData, ErrorResponse};

const DONATIONS_CACHE_KEY: &str = "donations:paid";

/// Loads the donation feed, served from cache while it is fresh.
///
/// Concurrent misses share a single load of the underlying feed.
pub async fn load_feed(state: &AppState) -> DonationFeed {
    let CachedData::Donations(feed) = state
        .cache
        .get_with(DONATIONS_CACHE_KEY.to_string(), async {
            debug!("Donation feed cache miss, loading");
            CachedData::Donations(state.feed.load().await)
        })
        .await;

    debug!("Donation feed has {} records ({:?})", feed.records.len(), feed.origin);
    feed
}

/// Monthly donation series
///
/// Paid donations grouped by calendar month (UTC), oldest month first.
#[utoipa::path(
    get,
    path = "/api/v1/donations/monthly",
    tag = "donations",
    responses(
        (status = 200, description = "Monthly donation totals", body = ApiResponse<MonthlyDonationsResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_monthly_donations(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<MonthlyDonationsResponse>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_monthly_donations function");

    let feed = load_feed(&state).await;
    let months = aggregate_by_month(&feed.records);

    info!("Aggregated {} donations into {} months", feed.records.len(), months.len());
    Ok(Json(ApiResponse::ok(
        MonthlyDonationsResponse {
            origin: feed.origin,
            months,
        },
        "Monthly donations retrieved successfully",
    )))
}

/// Donation summary
///
/// Totals, average donation and month-over-month growth of the latest month.
#[utoipa::path(
    get,
    path = "/api/v1/donations/summary",
    tag = "donations",
    responses(
        (status = 200, description = "Donation summary", body = ApiResponse<DonationSummaryResponse>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_donation_summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DonationSummaryResponse>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_donation_summary function");

    let feed = load_feed(&state).await;
    let summary = summarize(&feed.records);

    info!(
        "Summarized {} donations, growth {:.1}%",
        summary.count, summary.month_over_month_growth_percent
    );
    Ok(Json(ApiResponse::ok(
        DonationSummaryResponse {
            origin: feed.origin,
            summary,
        },
        "Donation summary retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::DonationFeedProvider;
    use crate::test_utils::test_utils::{setup_test_app_state, test_feed};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingFeed {
        loads: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DonationFeedProvider for CountingFeed {
        async fn load(&self) -> DonationFeed {
            self.loads.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            test_feed().load().await
        }
    }

    #[tokio::test]
    async fn test_concurrent_misses_load_feed_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let mut state = setup_test_app_state().await;
        state.feed = Arc::new(CountingFeed {
            loads: loads.clone(),
        });

        let feeds = load_concurrently(&state).await;

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(feeds.iter().all(|feed| feed.records.len() == 600));

        load_feed(&state).await;
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    async fn load_concurrently(state: &AppState) -> Vec<DonationFeed> {
        let (a, b, c, d) = tokio::join!(
            load_feed(state),
            load_feed(state),
            load_feed(state),
            load_feed(state)
        );
        vec![a, b, c, d]
    }
}
