//! Donation aggregation.
//!
//! Turns a flat list of donation transactions into calendar-month buckets and
//! headline summary numbers. Every function here is pure: inputs are borrowed,
//! never mutated, and degenerate inputs (empty lists, missing amounts, empty
//! months) produce well-defined zero values instead of errors.

pub mod frame;

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use common::{DonationRecord, DonationSummary, MonthlyAggregate};
use tracing::{debug, instrument, trace};

pub use frame::MonthlyAggregatePolars;

/// Groups donations by the calendar month (UTC) of their timestamp.
///
/// Buckets are returned in ascending chronological order. Months without any
/// donation produce no bucket; callers that need a continuous series have to
/// fill the gaps themselves.
#[instrument(skip(records), fields(records = records.len()))]
pub fn aggregate_by_month(records: &[DonationRecord]) -> Vec<MonthlyAggregate> {
    let mut buckets: BTreeMap<(i32, u32), MonthlyAggregate> = BTreeMap::new();

    for record in records {
        let year = record.timestamp.year();
        let month = record.timestamp.month();

        let bucket = buckets.entry((year, month)).or_insert_with(|| {
            trace!(year, month, "Opening monthly bucket");
            MonthlyAggregate {
                month_key: format!("{:04}-{:02}", year, month),
                total_local: 0.0,
                total_foreign: 0.0,
                count: 0,
                period_start: first_day_of_month(record.timestamp.date_naive()),
            }
        });

        bucket.total_local += record.local_amount();
        bucket.total_foreign += record.foreign_amount();
        bucket.count += 1;
    }

    debug!("Aggregated donations into {} monthly buckets", buckets.len());
    buckets.into_values().collect()
}

/// Computes totals, the average donation and month-over-month growth.
#[instrument(skip(records), fields(records = records.len()))]
pub fn summarize(records: &[DonationRecord]) -> DonationSummary {
    let total_local: f64 = records.iter().map(DonationRecord::local_amount).sum();
    let total_foreign: f64 = records.iter().map(DonationRecord::foreign_amount).sum();
    let count = records.len() as u64;

    let average = if count > 0 {
        total_local / count as f64
    } else {
        0.0
    };

    let monthly = aggregate_by_month(records);

    DonationSummary {
        total_local,
        total_foreign,
        count,
        average,
        month_over_month_growth_percent: month_over_month_growth(&monthly),
    }
}

/// Growth of the last bucket's local total over the one before it, in percent.
///
/// Returns `0` with fewer than two buckets or when the previous month's total
/// is zero.
pub fn month_over_month_growth(series: &[MonthlyAggregate]) -> f64 {
    let [.., previous, latest] = series else {
        return 0.0;
    };

    if previous.total_local <= 0.0 {
        return 0.0;
    }

    let growth = (latest.total_local - previous.total_local) / previous.total_local * 100.0;
    if growth.is_finite() { growth } else { 0.0 }
}

fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    // Day 1 exists in every month, so with_day(1) cannot fail.
    date.with_day(1).unwrap_or(date)
}
