use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use common::{DonationRecord, DonationStatus};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, trace, warn};

use super::{DonationSource, FeedError};

/// Metabase database id holding the payments schema.
const DATABASE_ID: i64 = 2;

/// Per attempt; the fallback budget bounds the attempts together.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Paid donations of the last twelve months, newest first. Only the columns the
/// aggregates need are selected, in the order `decode_row` expects them.
const DONATIONS_QUERY: &str = r#"SELECT
  "public"."payment_donation"."id" AS "id",
  "public"."payment_donation"."amount_egp" AS "amount_egp",
  "public"."payment_donation"."amount_usd" AS "amount_usd",
  "public"."payment_donation"."currency" AS "currency",
  "public"."payment_donation"."date" AS "date",
  "public"."payment_donation"."status" AS "status"
FROM
  "public"."payment_donation"
WHERE
  "public"."payment_donation"."status" = 'paid'
  AND "public"."payment_donation"."date" >= NOW() - INTERVAL '12 months'
ORDER BY
  "public"."payment_donation"."date" DESC
LIMIT
  5000"#;

const COL_ID: usize = 0;
const COL_AMOUNT_LOCAL: usize = 1;
const COL_AMOUNT_FOREIGN: usize = 2;
const COL_DATE: usize = 4;
const COL_STATUS: usize = 5;

#[derive(Debug, Deserialize)]
struct DatasetResponse {
    data: DatasetData,
}

#[derive(Debug, Deserialize)]
struct DatasetData {
    #[serde(default)]
    rows: Vec<Vec<Value>>,
}

/// Reads donations through the Metabase `/api/dataset` endpoint.
pub struct MetabaseSource {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl MetabaseSource {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, FeedError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            client,
        })
    }

    fn dataset_url(&self) -> String {
        format!("{}/api/dataset", self.base_url)
    }
}

#[async_trait]
impl DonationSource for MetabaseSource {
    fn name(&self) -> &'static str {
        "metabase"
    }

    #[instrument(skip(self), fields(url = %self.dataset_url()))]
    async fn fetch(&self) -> Result<Vec<DonationRecord>, FeedError> {
        trace!("Entering MetabaseSource::fetch");

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| FeedError::NotConfigured("METABASE_API_KEY is not set".to_string()))?;

        let body = json!({
            "database": DATABASE_ID,
            "type": "native",
            "native": { "query": DONATIONS_QUERY },
        });

        let response = self
            .client
            .post(self.dataset_url())
            .header("X-API-KEY", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Metabase returned HTTP {}", status);
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let dataset: DatasetResponse = response
            .json()
            .await
            .map_err(|e| FeedError::Decode(format!("Unexpected dataset payload: {}", e)))?;

        let records = decode_rows(&dataset.data.rows);
        info!("Fetched {} donations from Metabase", records.len());
        Ok(records)
    }
}

/// Decodes positional dataset rows, skipping rows without a usable date.
fn decode_rows(rows: &[Vec<Value>]) -> Vec<DonationRecord> {
    let mut skipped = 0usize;
    let records: Vec<DonationRecord> = rows
        .iter()
        .filter_map(|row| match decode_row(row) {
            Ok(record) => Some(record),
            Err(e) => {
                skipped += 1;
                debug!("Skipping donation row: {}", e);
                None
            }
        })
        .collect();

    if skipped > 0 {
        warn!("Skipped {} donation rows that could not be decoded", skipped);
    }
    records
}

fn decode_row(row: &[Value]) -> Result<DonationRecord, FeedError> {
    let date = row
        .get(COL_DATE)
        .and_then(Value::as_str)
        .ok_or_else(|| FeedError::Decode("missing date column".to_string()))?;
    let timestamp = parse_timestamp(date)
        .ok_or_else(|| FeedError::Decode(format!("unrecognised date '{}'", date)))?;

    let status = match row.get(COL_STATUS).and_then(Value::as_str) {
        Some(s) if s.eq_ignore_ascii_case("paid") => DonationStatus::Paid,
        Some(_) => DonationStatus::Other,
        // The query already filters on status.
        None => DonationStatus::Paid,
    };

    Ok(DonationRecord {
        id: row.get(COL_ID).and_then(Value::as_i64),
        amount_local: row.get(COL_AMOUNT_LOCAL).and_then(number),
        amount_foreign: row.get(COL_AMOUNT_FOREIGN).and_then(number),
        timestamp,
        status,
    })
}

/// Numeric cell; Metabase renders some numeric columns as strings.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts RFC 3339 and naive `YYYY-MM-DD[T ]HH:MM:SS[.fff]` (read as UTC).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
    use chrono::{Datelike, Timelike};
    use tokio::net::TcpListener;

    async fn spawn_fake_metabase(status: StatusCode, payload: Value) -> String {
        let app = Router::new().route(
            "/api/dataset",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let payload = payload.clone();
                async move {
                    let key = headers.get("X-API-KEY").and_then(|v| v.to_str().ok());
                    if key != Some("secret") || body["type"] != "native" {
                        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "denied"})));
                    }
                    (status, Json(payload))
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", address)
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let rfc = parse_timestamp("2024-03-15T10:30:00+02:00").unwrap();
        assert_eq!(rfc.hour(), 8);

        let naive = parse_timestamp("2024-03-15T10:30:00.123").unwrap();
        assert_eq!(naive.day(), 15);
        assert_eq!(naive.hour(), 10);

        let spaced = parse_timestamp("2024-03-15 10:30:00").unwrap();
        assert_eq!(spaced.minute(), 30);

        let date_only = parse_timestamp("2024-03-15").unwrap();
        assert_eq!(date_only.hour(), 0);

        assert!(parse_timestamp("15/03/2024").is_none());
    }

    #[test]
    fn test_decode_rows_positional() {
        let rows: Vec<Vec<Value>> = serde_json::from_value(json!([
            [1, 150.5, 4.82, "EGP", "2024-03-15T10:00:00Z", "paid"],
            [2, null, "3.10", "EGP", "2024-03-16T11:00:00", "paid"],
            [3, 20, 0.64, "EGP", "not a date", "paid"],
            [4, 99, 3.17, "EGP", "2024-04-01T00:00:00Z", "refunded"]
        ]))
        .unwrap();

        let records = decode_rows(&rows);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, Some(1));
        assert_eq!(records[0].amount_local, Some(150.5));
        assert_eq!(records[1].amount_local, None);
        assert_eq!(records[1].amount_foreign, Some(3.10));
        assert_eq!(records[2].status, DonationStatus::Other);
    }

    #[tokio::test]
    async fn test_fetch_without_api_key_is_not_configured() {
        let source = MetabaseSource::new("http://127.0.0.1:9", None).unwrap();
        let result = source.fetch().await;

        assert!(matches!(result, Err(FeedError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_fetch_against_fake_server() {
        let base_url = spawn_fake_metabase(
            StatusCode::OK,
            json!({
                "data": {
                    "rows": [
                        [10, 300.0, 9.62, "EGP", "2024-01-05T12:00:00Z", "paid"],
                        [11, 50.0, 1.6, "EGP", "2024-02-01T12:00:00Z", "paid"]
                    ],
                    "cols": []
                }
            }),
        )
        .await;

        let source = MetabaseSource::new(base_url, Some("secret".to_string())).unwrap();
        let records = source.fetch().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, Some(10));
        assert_eq!(records[1].local_amount(), 50.0);
    }

    #[tokio::test]
    async fn test_fetch_reports_upstream_status() {
        let base_url = spawn_fake_metabase(StatusCode::BAD_GATEWAY, json!({"error": "down"})).await;

        let source = MetabaseSource::new(base_url, Some("secret".to_string())).unwrap();
        let error = source.fetch().await.unwrap_err();

        assert!(matches!(error, FeedError::Status { status: 502, .. }));
        assert!(error.is_retryable());
    }
}
