use common::MonthlyAggregate;
use polars::prelude::*;
use tracing::{debug, trace};

use crate::error::Result;

/// Extension trait for converting a monthly donation series to Polars.
pub trait MonthlyAggregatePolars {
    /// Builds a DataFrame with one row per month.
    ///
    /// Columns: `month`, `period_start` (Date), `total_local`, `total_foreign`,
    /// `count`, `average`.
    fn to_df(&self) -> Result<DataFrame>;
}

impl MonthlyAggregatePolars for [MonthlyAggregate] {
    fn to_df(&self) -> Result<DataFrame> {
        trace!("Converting {} monthly buckets to DataFrame", self.len());

        let mut months = Vec::with_capacity(self.len());
        let mut period_starts = Vec::with_capacity(self.len());
        let mut totals_local = Vec::with_capacity(self.len());
        let mut totals_foreign = Vec::with_capacity(self.len());
        let mut counts = Vec::with_capacity(self.len());
        let mut averages = Vec::with_capacity(self.len());

        for bucket in self {
            months.push(bucket.month_key.clone());
            period_starts.push(bucket.period_start);
            totals_local.push(bucket.total_local);
            totals_foreign.push(bucket.total_foreign);
            counts.push(bucket.count);
            averages.push(bucket.average_per_record());
        }

        let df = DataFrame::new(vec![
            Series::new("month".into(), months).into(),
            Series::new("period_start".into(), period_starts).into(),
            Series::new("total_local".into(), totals_local).into(),
            Series::new("total_foreign".into(), totals_foreign).into(),
            Series::new("count".into(), counts).into(),
            Series::new("average".into(), averages).into(),
        ])?;

        debug!("Created monthly donations DataFrame with shape {:?}", df.shape());
        Ok(df)
    }
}

impl MonthlyAggregatePolars for Vec<MonthlyAggregate> {
    fn to_df(&self) -> Result<DataFrame> {
        self.as_slice().to_df()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bucket(key: &str, year: i32, month: u32, total: f64, count: u64) -> MonthlyAggregate {
        MonthlyAggregate {
            month_key: key.to_string(),
            total_local: total,
            total_foreign: total / 31.2,
            count,
            period_start: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
        }
    }

    #[test]
    fn test_monthly_series_to_df() {
        let series = vec![
            bucket("2024-01", 2024, 1, 300.0, 2),
            bucket("2024-02", 2024, 2, 50.0, 1),
        ];

        let df = series.to_df().unwrap();
        assert_eq!(df.shape(), (2, 6));

        let column_names = df.get_column_names();
        assert!(column_names.iter().any(|name| name.contains("month")));
        assert!(column_names.iter().any(|name| name.contains("period_start")));

        let totals = df.column("total_local").unwrap();
        if let AnyValue::Float64(total) = totals.get(0).unwrap() {
            assert_eq!(total, 300.0);
        } else {
            panic!("Expected Float64 value for total_local");
        }

        let averages = df.column("average").unwrap();
        if let AnyValue::Float64(average) = averages.get(0).unwrap() {
            assert_eq!(average, 150.0);
        } else {
            panic!("Expected Float64 value for average");
        }

        let counts = df.column("count").unwrap();
        if let AnyValue::UInt64(count) = counts.get(1).unwrap() {
            assert_eq!(count, 1);
        } else {
            panic!("Expected UInt64 value for count");
        }
    }

    #[test]
    fn test_empty_series_to_df() {
        let series: Vec<MonthlyAggregate> = vec![];
        let df = series.to_df().unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 6);
    }
}
