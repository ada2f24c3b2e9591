use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::scenario::{CalculatedMetrics, Factor, ScenarioFactors};
use crate::format::MetricKind;
use crate::user::UserId;

/// A what-if scenario saved by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SavedScenarioDto {
    pub id: i32,
    pub user_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub scenario_data: ScenarioFactors,
    pub results: Option<CalculatedMetrics>,
    pub tags: Vec<String>,
    pub is_favorite: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub last_viewed_at: Option<NaiveDateTime>,
}

/// Request body for saving a scenario.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateSavedScenarioRequest {
    pub name: String,
    pub description: Option<String>,
    pub scenario_data: ScenarioFactors,
    /// Computed against the reference baseline when omitted
    pub results: Option<CalculatedMetrics>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Request body for updating a saved scenario. Absent fields stay unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
pub struct UpdateSavedScenarioRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub scenario_data: Option<ScenarioFactors>,
    pub results: Option<CalculatedMetrics>,
    pub tags: Option<Vec<String>>,
    pub is_favorite: Option<bool>,
}

/// One input factor of two compared scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FactorComparison {
    pub factor: Factor,
    pub label: String,
    pub left: f64,
    pub right: f64,
    /// `left - right`
    pub difference: f64,
}

/// One result metric of two compared scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MetricComparison {
    pub metric: MetricKind,
    pub label: String,
    pub left: f64,
    pub right: f64,
    /// `left - right`
    pub difference: f64,
    pub left_formatted: String,
    pub right_formatted: String,
}

/// Side-by-side comparison of two saved scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScenarioComparisonDto {
    pub left_id: i32,
    pub right_id: i32,
    pub factors: Vec<FactorComparison>,
    /// Empty when either scenario has no stored results
    pub results: Vec<MetricComparison>,
}
