use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payment status of a donation as reported by the donation platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    #[default]
    Paid,
    /// Pending, failed, refunded, ... Everything that is not a settled payment.
    #[serde(other)]
    Other,
}

/// One completed donation transaction.
///
/// Amounts are optional because the upstream dataset contains nulls; use
/// [`DonationRecord::local_amount`] and [`DonationRecord::foreign_amount`]
/// when summing, they coerce missing and negative values to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DonationRecord {
    pub id: Option<i64>,
    /// Amount in the currency of record (EGP)
    #[serde(alias = "amount_egp")]
    pub amount_local: Option<f64>,
    /// Amount in the secondary currency (USD)
    #[serde(alias = "amount_usd")]
    pub amount_foreign: Option<f64>,
    #[serde(alias = "date")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: DonationStatus,
}

impl DonationRecord {
    pub fn new(timestamp: DateTime<Utc>, amount_local: f64, amount_foreign: f64) -> Self {
        Self {
            id: None,
            amount_local: Some(amount_local),
            amount_foreign: Some(amount_foreign),
            timestamp,
            status: DonationStatus::Paid,
        }
    }

    pub fn local_amount(&self) -> f64 {
        sanitize_amount(self.amount_local)
    }

    pub fn foreign_amount(&self) -> f64 {
        sanitize_amount(self.amount_foreign)
    }

    pub fn is_paid(&self) -> bool {
        self.status == DonationStatus::Paid
    }
}

fn sanitize_amount(amount: Option<f64>) -> f64 {
    match amount {
        Some(value) if value.is_finite() && value > 0.0 => value,
        _ => 0.0,
    }
}

/// All donations of one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyAggregate {
    /// `YYYY-MM`
    pub month_key: String,
    pub total_local: f64,
    pub total_foreign: f64,
    pub count: u64,
    /// First day of the month
    pub period_start: NaiveDate,
}

impl MonthlyAggregate {
    pub fn average_per_record(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_local / self.count as f64
        }
    }
}

/// Headline numbers over a set of donations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct DonationSummary {
    pub total_local: f64,
    pub total_foreign: f64,
    pub count: u64,
    /// Average local amount per donation
    pub average: f64,
    /// Growth of the latest month's local total over the month before it
    pub month_over_month_growth_percent: f64,
}

/// Where a donation feed result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    Live,
    Mock,
}

/// Monthly donation series as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyDonationsResponse {
    pub origin: DataOrigin,
    pub months: Vec<MonthlyAggregate>,
}

/// Donation summary as served to the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DonationSummaryResponse {
    pub origin: DataOrigin,
    pub summary: DonationSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_missing_and_negative_amounts_are_zero() {
        let record = DonationRecord {
            id: Some(1),
            amount_local: None,
            amount_foreign: Some(-4.0),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap(),
            status: DonationStatus::Paid,
        };

        assert_eq!(record.local_amount(), 0.0);
        assert_eq!(record.foreign_amount(), 0.0);
    }

    #[test]
    fn test_deserialize_upstream_field_names() {
        let json = r#"{
            "id": 7,
            "amount_egp": 150.5,
            "amount_usd": null,
            "date": "2024-03-15T10:00:00Z",
            "status": "paid"
        }"#;

        let record: DonationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, Some(7));
        assert_eq!(record.local_amount(), 150.5);
        assert_eq!(record.amount_foreign, None);
        assert!(record.is_paid());
    }

    #[test]
    fn test_unknown_status_is_other() {
        let json = r#"{"id": null, "amount_local": 1.0, "amount_foreign": 0.1,
            "timestamp": "2024-03-15T10:00:00Z", "status": "refunded"}"#;

        let record: DonationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, DonationStatus::Other);
    }

    #[test]
    fn test_average_per_record_empty_bucket() {
        let bucket = MonthlyAggregate {
            month_key: "2024-01".to_string(),
            total_local: 0.0,
            total_foreign: 0.0,
            count: 0,
            period_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        };
        assert_eq!(bucket.average_per_record(), 0.0);
    }
}
