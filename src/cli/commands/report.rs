use std::fmt::Write;

use anyhow::Result;
use common::format::{DEFAULT_CURRENCY, MetricFormat, format_change, format_metric};
use compute::donations::MonthlyAggregatePolars;
use compute::{aggregate_by_month, summarize};
use tracing::{info, trace};

use crate::config::{FeedConfig, build_feed};
use crate::feeds::DonationFeed;

pub async fn print_report(config: &FeedConfig) -> Result<()> {
    trace!("Entering print_report function");

    let feed = build_feed(config)?.load().await;
    info!("Loaded {} donations ({:?})", feed.records.len(), feed.origin);

    print!("{}", render_report(&feed)?);
    Ok(())
}

/// Monthly table followed by the headline numbers.
pub fn render_report(feed: &DonationFeed) -> Result<String> {
    let months = aggregate_by_month(&feed.records);
    let summary = summarize(&feed.records);
    let df = months.to_df()?;

    let mut out = String::new();
    writeln!(out, "Donations by month ({:?} data)", feed.origin)?;
    writeln!(out, "{}", df)?;
    writeln!(
        out,
        "Total:     {}",
        format_metric(summary.total_local, MetricFormat::Currency, DEFAULT_CURRENCY)
    )?;
    writeln!(
        out,
        "Total USD: {}",
        format_metric(summary.total_foreign, MetricFormat::Currency, "USD")
    )?;
    writeln!(
        out,
        "Donations: {}",
        format_metric(summary.count as f64, MetricFormat::Number, DEFAULT_CURRENCY)
    )?;
    writeln!(
        out,
        "Average:   {}",
        format_metric(summary.average, MetricFormat::Currency, DEFAULT_CURRENCY)
    )?;
    writeln!(
        out,
        "Growth:    {} month over month",
        format_change(summary.month_over_month_growth_percent)
    )?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::MockSource;
    use chrono::{NaiveDate, TimeZone, Utc};
    use common::DataOrigin;

    #[test]
    fn test_report_lists_months_and_totals() {
        let records = MockSource::new(200, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 11)
            .with_now(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap())
            .generate();
        let feed = DonationFeed {
            records,
            origin: DataOrigin::Mock,
        };

        let report = render_report(&feed).unwrap();

        assert!(report.contains("Mock data"));
        assert!(report.contains("2024-01"));
        assert!(report.contains("2024-03"));
        assert!(report.contains("Donations: 200"));
        assert!(report.contains("Total:     EGP "));
    }

    #[test]
    fn test_report_on_empty_feed() {
        let feed = DonationFeed {
            records: Vec::new(),
            origin: DataOrigin::Live,
        };

        let report = render_report(&feed).unwrap();

        assert!(report.contains("Donations: 0"));
        assert!(report.contains("Growth:    0.0% month over month"));
    }
}
