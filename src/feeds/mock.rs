use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use common::{DataOrigin, DonationRecord, DonationStatus};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

use super::{DonationFeed, DonationFeedProvider, DonationSource, FeedError};

/// EGP per USD used to derive the foreign amount.
pub const EXCHANGE_RATE: f64 = 31.2;

/// Synthetic donation feed with seasonal giving patterns.
///
/// Deterministic for a given seed and `now`.
#[derive(Debug, Clone)]
pub struct MockSource {
    count: usize,
    start: NaiveDate,
    seed: u64,
    now: Option<DateTime<Utc>>,
}

impl Default for MockSource {
    fn default() -> Self {
        Self {
            count: 2500,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            seed: 0x00EF_B2024,
            now: None,
        }
    }
}

impl MockSource {
    pub fn new(count: usize, start: NaiveDate, seed: u64) -> Self {
        Self {
            count,
            start,
            seed,
            now: None,
        }
    }

    /// Pins the end of the generated range instead of using the wall clock.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    #[instrument(skip(self), fields(count = self.count, seed = self.seed))]
    pub fn generate(&self) -> Vec<DonationRecord> {
        let now = self.now.unwrap_or_else(Utc::now);
        let start = self.start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
        let span_ms = (now - start).num_milliseconds().max(0);
        let mut rng = StdRng::seed_from_u64(self.seed);

        let records: Vec<DonationRecord> = (0..self.count)
            .map(|i| {
                let offset = if span_ms > 0 { rng.gen_range(0..span_ms) } else { 0 };
                let timestamp = start + Duration::milliseconds(offset);
                let amount = base_amount(&mut rng) * seasonal_multiplier(timestamp.month());

                DonationRecord {
                    id: Some(i as i64 + 1),
                    amount_local: Some(round2(amount)),
                    amount_foreign: Some(round2(amount / EXCHANGE_RATE)),
                    timestamp,
                    status: DonationStatus::Paid,
                }
            })
            .collect();

        debug!("Generated {} mock donations", records.len());
        records
    }
}

/// Ramadan (March, April) and year-end giving peak, summer slows down.
fn seasonal_multiplier(month: u32) -> f64 {
    match month {
        3 | 4 => 2.5,
        12 => 1.8,
        7 | 8 => 0.7,
        _ => 1.0,
    }
}

/// 60% small, 25% medium, 10% large, 5% major gifts.
fn base_amount(rng: &mut StdRng) -> f64 {
    let tier: f64 = rng.r#gen();
    let (low, high) = if tier < 0.6 {
        (50.0, 300.0)
    } else if tier < 0.85 {
        (300.0, 1_000.0)
    } else if tier < 0.95 {
        (1_000.0, 5_000.0)
    } else {
        (5_000.0, 25_000.0)
    };
    rng.gen_range(low..high)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait]
impl DonationSource for MockSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch(&self) -> Result<Vec<DonationRecord>, FeedError> {
        Ok(self.generate())
    }
}

#[async_trait]
impl DonationFeedProvider for MockSource {
    async fn load(&self) -> DonationFeed {
        DonationFeed {
            records: self.generate(),
            origin: DataOrigin::Mock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pinned() -> MockSource {
        MockSource::new(2500, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 7)
            .with_now(Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap())
    }

    #[test]
    fn test_generates_requested_count_in_range() {
        let source = pinned();
        let records = source.generate();

        assert_eq!(records.len(), 2500);
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap();
        assert!(records.iter().all(|r| r.timestamp >= start && r.timestamp < end));
        assert!(records.iter().all(|r| r.is_paid()));
    }

    #[test]
    fn test_amounts_within_tiers_and_foreign_derived() {
        for record in pinned().generate() {
            let local = record.local_amount();
            assert!(local >= 50.0 * 0.7 - 0.01 && local <= 25_000.0 * 2.5 + 0.01);

            let expected_foreign = round2(local / EXCHANGE_RATE);
            assert!((record.foreign_amount() - expected_foreign).abs() <= 0.011);
        }
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        assert_eq!(pinned().generate(), pinned().generate());

        let other_seed = MockSource::new(2500, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 8)
            .with_now(Utc.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap());
        assert_ne!(pinned().generate(), other_seed.generate());
    }

    #[test]
    fn test_ramadan_months_outgive_summer() {
        let monthly = compute::aggregate_by_month(&pinned().generate());
        let average_of = |key: &str| {
            monthly
                .iter()
                .find(|m| m.month_key == key)
                .map(|m| m.average_per_record())
                .unwrap()
        };

        assert!(average_of("2024-03") > average_of("2024-07"));
        assert!(average_of("2025-04") > average_of("2024-08"));
    }

    #[test]
    fn test_empty_range_does_not_panic() {
        let source = MockSource::new(3, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 1)
            .with_now(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        let records = source.generate();

        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn test_provider_reports_mock_origin() {
        let feed = MockSource::new(10, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 1)
            .with_now(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap())
            .load()
            .await;

        assert_eq!(feed.origin, DataOrigin::Mock);
        assert_eq!(feed.records.len(), 10);
    }
}
