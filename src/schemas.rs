use std::sync::Arc;

use axum::{Json, http::StatusCode};
use common::format::{MetricFormat, MetricKind};
use common::notifications::{
    CreateNotificationRequest, NotificationCategory, NotificationDto, NotificationKind,
    NotificationListDto, NotificationPriority,
};
use common::preferences::{
    DisplaySettings, NotificationSettings, Theme, UpdatePreferencesRequest, UserPreferencesDto,
};
use common::saved_scenario::{
    CreateSavedScenarioRequest, FactorComparison, MetricComparison, SavedScenarioDto,
    ScenarioComparisonDto, UpdateSavedScenarioRequest,
};
use common::user::UserIdentityDto;
use common::{
    BaselineMetrics, CalculateScenarioRequest, CalculatedMetrics, DataOrigin, DonationRecord,
    DonationStatus, DonationSummary, DonationSummaryResponse, Factor, MonthlyAggregate,
    MonthlyDonationsResponse, ScenarioFactors, UserId,
};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};

use crate::feeds::{DonationFeed, DonationFeedProvider};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for expensive operations
    pub cache: Cache<String, CachedData>,
    /// Where donation records come from
    pub feed: Arc<dyn DonationFeedProvider>,
    /// Baseline used for ad-hoc and saved scenario calculations
    pub baseline: BaselineMetrics,
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedData {
    Donations(DonationFeed),
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
#[aliases(
    MonthlyDonationsApiResponse = ApiResponse<MonthlyDonationsResponse>,
    DonationSummaryApiResponse = ApiResponse<DonationSummaryResponse>,
    BaselineApiResponse = ApiResponse<BaselineMetrics>,
    CalculatedMetricsApiResponse = ApiResponse<CalculatedMetrics>,
    UserIdentityApiResponse = ApiResponse<UserIdentityDto>,
    SavedScenarioApiResponse = ApiResponse<SavedScenarioDto>,
    SavedScenarioListApiResponse = ApiResponse<Vec<SavedScenarioDto>>,
    ScenarioComparisonApiResponse = ApiResponse<ScenarioComparisonDto>,
    PreferencesApiResponse = ApiResponse<UserPreferencesDto>,
    NotificationApiResponse = ApiResponse<NotificationDto>,
    NotificationListApiResponse = ApiResponse<NotificationListDto>
)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Error half of every handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Logs a failed database call and hides the details from the client.
pub fn database_error(action: &str, e: impl std::fmt::Display) -> ApiError {
    error!("Failed to {}: {}", action, e);
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "DATABASE_ERROR",
        format!("Failed to {}", action),
    )
}

/// A stored row that no longer decodes into its API form.
pub fn conversion_error(e: String) -> ApiError {
    error!("Failed to convert stored row: {}", e);
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "CONVERSION_ERROR",
        "Stored data could not be read",
    )
}

/// Validates a user id taken from the request path.
pub fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    raw.parse().map_err(|e| {
        warn!("Rejected user id '{}': {}", raw, e);
        api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_USER_ID",
            format!("Invalid user id: {}", e),
        )
    })
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::donations::get_monthly_donations,
        crate::handlers::donations::get_donation_summary,
        crate::handlers::scenarios::get_baseline,
        crate::handlers::scenarios::calculate,
        crate::handlers::identity::create_identity,
        crate::handlers::saved_scenarios::list_saved_scenarios,
        crate::handlers::saved_scenarios::create_saved_scenario,
        crate::handlers::saved_scenarios::get_saved_scenario,
        crate::handlers::saved_scenarios::update_saved_scenario,
        crate::handlers::saved_scenarios::delete_saved_scenario,
        crate::handlers::saved_scenarios::toggle_favorite,
        crate::handlers::saved_scenarios::mark_viewed,
        crate::handlers::saved_scenarios::compare_saved_scenarios,
        crate::handlers::preferences::get_preferences,
        crate::handlers::preferences::update_preferences,
        crate::handlers::preferences::toggle_pinned_metric,
        crate::handlers::preferences::toggle_favorite_section,
        crate::handlers::notifications::list_notifications,
        crate::handlers::notifications::create_notification,
        crate::handlers::notifications::mark_read,
        crate::handlers::notifications::mark_all_read,
        crate::handlers::notifications::dismiss,
    ),
    components(
        schemas(
            MonthlyDonationsApiResponse,
            DonationSummaryApiResponse,
            BaselineApiResponse,
            CalculatedMetricsApiResponse,
            UserIdentityApiResponse,
            SavedScenarioApiResponse,
            SavedScenarioListApiResponse,
            ScenarioComparisonApiResponse,
            PreferencesApiResponse,
            NotificationApiResponse,
            NotificationListApiResponse,
            ErrorResponse,
            HealthResponse,
            DonationRecord,
            DonationStatus,
            MonthlyAggregate,
            DonationSummary,
            DataOrigin,
            MonthlyDonationsResponse,
            DonationSummaryResponse,
            ScenarioFactors,
            Factor,
            BaselineMetrics,
            CalculatedMetrics,
            CalculateScenarioRequest,
            MetricKind,
            MetricFormat,
            UserId,
            UserIdentityDto,
            SavedScenarioDto,
            CreateSavedScenarioRequest,
            UpdateSavedScenarioRequest,
            FactorComparison,
            MetricComparison,
            ScenarioComparisonDto,
            Theme,
            NotificationSettings,
            DisplaySettings,
            UserPreferencesDto,
            UpdatePreferencesRequest,
            NotificationKind,
            NotificationCategory,
            NotificationPriority,
            NotificationDto,
            CreateNotificationRequest,
            NotificationListDto,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "donations", description = "Donation aggregates"),
        (name = "scenarios", description = "What-if scenario calculator"),
        (name = "users", description = "User identity"),
        (name = "saved-scenarios", description = "Scenarios saved per user"),
        (name = "preferences", description = "Dashboard preferences per user"),
        (name = "notifications", description = "Notification center"),
    ),
    info(
        title = "Impactboard API",
        description = "Humanitarian impact dashboard API - donation aggregates, what-if scenarios and per-user dashboard state",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
