use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use chrono::{NaiveDateTime, Utc};
use common::format::{DEFAULT_CURRENCY, MetricKind, format_metric};
use common::saved_scenario::{
    CreateSavedScenarioRequest, FactorComparison, MetricComparison, SavedScenarioDto,
    ScenarioComparisonDto, UpdateSavedScenarioRequest,
};
use common::{CalculatedMetrics, Factor, UserId};
use compute::calculate_scenario;
use model::entities::saved_scenario;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{debug, info, instrument, trace, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::helpers::converters::{saved_scenario_to_dto, to_json_column};
use crate::schemas::{
    ApiError, ApiResponse, AppState, ErrorResponse, api_error, conversion_error, database_error,
    parse_user_id,
};

/// Query parameters for comparing two saved scenarios
#[derive(Debug, Deserialize, ToSchema, IntoParams, Validate)]
pub struct CompareQuery {
    /// Scenario on the left side of the comparison
    #[validate(range(min = 1))]
    pub left: i32,
    /// Scenario on the right side of the comparison
    #[validate(range(min = 1))]
    pub right: i32,
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn name_required(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        warn!("Rejected saved scenario with empty name");
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_NAME",
            "Scenario name must not be empty",
        ));
    }
    Ok(())
}

/// Looks up a scenario that belongs to `user_id`; other users' rows are 404.
async fn find_owned(
    db: &DatabaseConnection,
    user_id: &UserId,
    scenario_id: i32,
) -> Result<saved_scenario::Model, ApiError> {
    saved_scenario::Entity::find_by_id(scenario_id)
        .filter(saved_scenario::Column::UserId.eq(user_id.as_str()))
        .one(db)
        .await
        .map_err(|e| database_error("load saved scenario", e))?
        .ok_or_else(|| {
            warn!("Saved scenario {} not found for user {}", scenario_id, user_id);
            api_error(
                StatusCode::NOT_FOUND,
                "SCENARIO_NOT_FOUND",
                format!("Saved scenario {} not found", scenario_id),
            )
        })
}

fn json_column<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    to_json_column(value).map_err(conversion_error)
}

/// List saved scenarios
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/scenarios",
    tag = "saved-scenarios",
    params(("user_id" = String, Path, description = "Opaque user id")),
    responses(
        (status = 200, description = "Saved scenarios, newest first", body = ApiResponse<Vec<SavedScenarioDto>>),
        (status = 400, description = "Invalid user id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_saved_scenarios(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<SavedScenarioDto>>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering list_saved_scenarios function");
    let user_id = parse_user_id(&user_id)?;

    let rows = saved_scenario::Entity::find()
        .filter(saved_scenario::Column::UserId.eq(user_id.as_str()))
        .order_by_desc(saved_scenario::Column::CreatedAt)
        .order_by_desc(saved_scenario::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| database_error("list saved scenarios", e))?;

    let scenarios = rows
        .into_iter()
        .map(saved_scenario_to_dto)
        .collect::<Result<Vec<_>, _>>()
        .map_err(conversion_error)?;

    info!("Retrieved {} saved scenarios for {}", scenarios.len(), user_id);
    Ok(Json(ApiResponse::ok(
        scenarios,
        "Saved scenarios retrieved successfully",
    )))
}

/// Save a scenario
///
/// Results are computed against the reference baseline when the request
/// does not carry them.
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/scenarios",
    tag = "saved-scenarios",
    params(("user_id" = String, Path, description = "Opaque user id")),
    request_body = CreateSavedScenarioRequest,
    responses(
        (status = 201, description = "Scenario saved", body = ApiResponse<SavedScenarioDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_saved_scenario(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<CreateSavedScenarioRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SavedScenarioDto>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering create_saved_scenario function");
    let user_id = parse_user_id(&user_id)?;
    name_required(&request.name)?;

    let results = match request.results {
        Some(results) => results,
        None => {
            debug!("No results supplied, calculating against the reference baseline");
            calculate_scenario(&state.baseline, &request.scenario_data)
        }
    };

    let timestamp = now();
    let new_scenario = saved_scenario::ActiveModel {
        user_id: Set(user_id.to_string()),
        name: Set(request.name.trim().to_string()),
        description: Set(request.description),
        scenario_data: Set(json_column(&request.scenario_data)?),
        results: Set(Some(json_column(&results)?)),
        tags: Set(json_column(&request.tags)?),
        is_favorite: Set(false),
        created_at: Set(timestamp),
        updated_at: Set(timestamp),
        last_viewed_at: Set(None),
        ..Default::default()
    };

    let model = new_scenario
        .insert(&state.db)
        .await
        .map_err(|e| database_error("save scenario", e))?;

    info!("Saved scenario {} '{}' for {}", model.id, model.name, user_id);
    let dto = saved_scenario_to_dto(model).map_err(conversion_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(dto, "Scenario saved successfully")),
    ))
}

/// Get a saved scenario
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/scenarios/{scenario_id}",
    tag = "saved-scenarios",
    params(
        ("user_id" = String, Path, description = "Opaque user id"),
        ("scenario_id" = i32, Path, description = "Saved scenario id"),
    ),
    responses(
        (status = 200, description = "Saved scenario", body = ApiResponse<SavedScenarioDto>),
        (status = 404, description = "Scenario not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_saved_scenario(
    Path((user_id, scenario_id)): Path<(String, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SavedScenarioDto>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_saved_scenario function");
    let user_id = parse_user_id(&user_id)?;

    let model = find_owned(&state.db, &user_id, scenario_id).await?;
    let dto = saved_scenario_to_dto(model).map_err(conversion_error)?;
    Ok(Json(ApiResponse::ok(dto, "Saved scenario retrieved successfully")))
}

/// Update a saved scenario
///
/// Only the fields present in the body change.
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/scenarios/{scenario_id}",
    tag = "saved-scenarios",
    params(
        ("user_id" = String, Path, description = "Opaque user id"),
        ("scenario_id" = i32, Path, description = "Saved scenario id"),
    ),
    request_body = UpdateSavedScenarioRequest,
    responses(
        (status = 200, description = "Scenario updated", body = ApiResponse<SavedScenarioDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Scenario not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_saved_scenario(
    Path((user_id, scenario_id)): Path<(String, i32)>,
    State(state): State<AppState>,
    Json(request): Json<UpdateSavedScenarioRequest>,
) -> Result<Json<ApiResponse<SavedScenarioDto>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering update_saved_scenario function");
    let user_id = parse_user_id(&user_id)?;

    let existing = find_owned(&state.db, &user_id, scenario_id).await?;
    let mut active: saved_scenario::ActiveModel = existing.into();

    if let Some(name) = request.name {
        name_required(&name)?;
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }
    if let Some(factors) = request.scenario_data {
        active.scenario_data = Set(json_column(&factors)?);
        // Stale results would no longer match the factors.
        if request.results.is_none() {
            let results = calculate_scenario(&state.baseline, &factors);
            active.results = Set(Some(json_column(&results)?));
        }
    }
    if let Some(results) = request.results {
        active.results = Set(Some(json_column(&results)?));
    }
    if let Some(tags) = request.tags {
        active.tags = Set(json_column(&tags)?);
    }
    if let Some(is_favorite) = request.is_favorite {
        active.is_favorite = Set(is_favorite);
    }
    active.updated_at = Set(now());

    let model = active
        .update(&state.db)
        .await
        .map_err(|e| database_error("update saved scenario", e))?;

    info!("Updated saved scenario {} for {}", model.id, user_id);
    let dto = saved_scenario_to_dto(model).map_err(conversion_error)?;
    Ok(Json(ApiResponse::ok(dto, "Scenario updated successfully")))
}

/// Delete a saved scenario
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/scenarios/{scenario_id}",
    tag = "saved-scenarios",
    params(
        ("user_id" = String, Path, description = "Opaque user id"),
        ("scenario_id" = i32, Path, description = "Saved scenario id"),
    ),
    responses(
        (status = 200, description = "Scenario deleted", body = ApiResponse<String>),
        (status = 404, description = "Scenario not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_saved_scenario(
    Path((user_id, scenario_id)): Path<(String, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<String>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering delete_saved_scenario function");
    let user_id = parse_user_id(&user_id)?;

    let result = saved_scenario::Entity::delete_many()
        .filter(saved_scenario::Column::Id.eq(scenario_id))
        .filter(saved_scenario::Column::UserId.eq(user_id.as_str()))
        .exec(&state.db)
        .await
        .map_err(|e| database_error("delete saved scenario", e))?;

    debug!("Delete operation completed. Rows affected: {}", result.rows_affected);
    if result.rows_affected == 0 {
        warn!("Saved scenario {} not found for deletion", scenario_id);
        return Err(api_error(
            StatusCode::NOT_FOUND,
            "SCENARIO_NOT_FOUND",
            format!("Saved scenario {} not found", scenario_id),
        ));
    }

    info!("Deleted saved scenario {} for {}", scenario_id, user_id);
    Ok(Json(ApiResponse::ok(
        format!("Scenario {} deleted", scenario_id),
        "Scenario deleted successfully",
    )))
}

/// Toggle the favorite flag
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/scenarios/{scenario_id}/favorite",
    tag = "saved-scenarios",
    params(
        ("user_id" = String, Path, description = "Opaque user id"),
        ("scenario_id" = i32, Path, description = "Saved scenario id"),
    ),
    responses(
        (status = 200, description = "Favorite flag flipped", body = ApiResponse<SavedScenarioDto>),
        (status = 404, description = "Scenario not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn toggle_favorite(
    Path((user_id, scenario_id)): Path<(String, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SavedScenarioDto>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering toggle_favorite function");
    let user_id = parse_user_id(&user_id)?;

    let existing = find_owned(&state.db, &user_id, scenario_id).await?;
    let favorite = !existing.is_favorite;
    let mut active: saved_scenario::ActiveModel = existing.into();
    active.is_favorite = Set(favorite);
    active.updated_at = Set(now());

    let model = active
        .update(&state.db)
        .await
        .map_err(|e| database_error("toggle favorite", e))?;

    debug!("Scenario {} favorite is now {}", model.id, model.is_favorite);
    let dto = saved_scenario_to_dto(model).map_err(conversion_error)?;
    Ok(Json(ApiResponse::ok(dto, "Favorite toggled successfully")))
}

/// Record that a scenario was opened
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/scenarios/{scenario_id}/viewed",
    tag = "saved-scenarios",
    params(
        ("user_id" = String, Path, description = "Opaque user id"),
        ("scenario_id" = i32, Path, description = "Saved scenario id"),
    ),
    responses(
        (status = 200, description = "View recorded", body = ApiResponse<SavedScenarioDto>),
        (status = 404, description = "Scenario not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn mark_viewed(
    Path((user_id, scenario_id)): Path<(String, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SavedScenarioDto>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering mark_viewed function");
    let user_id = parse_user_id(&user_id)?;

    let existing = find_owned(&state.db, &user_id, scenario_id).await?;
    let mut active: saved_scenario::ActiveModel = existing.into();
    active.last_viewed_at = Set(Some(now()));

    let model = active
        .update(&state.db)
        .await
        .map_err(|e| database_error("mark scenario viewed", e))?;

    let dto = saved_scenario_to_dto(model).map_err(conversion_error)?;
    Ok(Json(ApiResponse::ok(dto, "Scenario view recorded")))
}

/// Compare two saved scenarios
///
/// Differences are `left - right`, per factor and per calculated metric.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/scenarios/compare",
    tag = "saved-scenarios",
    params(
        ("user_id" = String, Path, description = "Opaque user id"),
        CompareQuery
    ),
    responses(
        (status = 200, description = "Side by side comparison", body = ApiResponse<ScenarioComparisonDto>),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 404, description = "Scenario not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn compare_saved_scenarios(
    Path(user_id): Path<String>,
    Valid(Query(query)): Valid<Query<CompareQuery>>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ScenarioComparisonDto>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering compare_saved_scenarios function");
    let user_id = parse_user_id(&user_id)?;

    let left = find_owned(&state.db, &user_id, query.left).await?;
    let right = find_owned(&state.db, &user_id, query.right).await?;
    let left = saved_scenario_to_dto(left).map_err(conversion_error)?;
    let right = saved_scenario_to_dto(right).map_err(conversion_error)?;

    let comparison = compare(&left, &right, |dto| {
        dto.results
            .unwrap_or_else(|| calculate_scenario(&state.baseline, &dto.scenario_data))
    });

    info!("Compared scenarios {} and {} for {}", left.id, right.id, user_id);
    Ok(Json(ApiResponse::ok(
        comparison,
        "Scenarios compared successfully",
    )))
}

/// Builds the comparison; `results_of` supplies results for rows saved without them.
pub fn compare(
    left: &SavedScenarioDto,
    right: &SavedScenarioDto,
    results_of: impl Fn(&SavedScenarioDto) -> CalculatedMetrics,
) -> ScenarioComparisonDto {
    let factors = Factor::ALL
        .iter()
        .map(|factor| {
            let l = left.scenario_data.get(*factor);
            let r = right.scenario_data.get(*factor);
            FactorComparison {
                factor: *factor,
                label: factor.label().to_string(),
                left: l,
                right: r,
                difference: l - r,
            }
        })
        .collect();

    let left_results = results_of(left);
    let right_results = results_of(right);
    let results = MetricKind::ALL
        .iter()
        .map(|kind| {
            let (l, _) = left_results.metric(*kind);
            let (r, _) = right_results.metric(*kind);
            MetricComparison {
                metric: *kind,
                label: kind.label().to_string(),
                left: l,
                right: r,
                difference: l - r,
                left_formatted: format_metric(l, kind.format(), DEFAULT_CURRENCY),
                right_formatted: format_metric(r, kind.format(), DEFAULT_CURRENCY),
            }
        })
        .collect();

    ScenarioComparisonDto {
        left_id: left.id,
        right_id: right.id,
        factors,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use common::{BaselineMetrics, ScenarioFactors};

    fn dto(id: i32, factors: ScenarioFactors) -> SavedScenarioDto {
        let at = NaiveDate::from_ymd_opt(2025, 2, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        SavedScenarioDto {
            id,
            user_id: "user_1_abc".parse().unwrap(),
            name: format!("scenario {}", id),
            description: None,
            scenario_data: factors,
            results: None,
            tags: Vec::new(),
            is_favorite: false,
            created_at: at,
            updated_at: at,
            last_viewed_at: None,
        }
    }

    #[test]
    fn test_compare_differences_are_left_minus_right() {
        let baseline = BaselineMetrics::fy2024_25();
        let left = dto(1, ScenarioFactors::default().with(Factor::FoodPrices, 20.0));
        let right = dto(2, ScenarioFactors::default().with(Factor::FoodPrices, 5.0));

        let comparison = compare(&left, &right, |d| calculate_scenario(&baseline, &d.scenario_data));

        assert_eq!(comparison.factors.len(), Factor::ALL.len());
        let food = comparison
            .factors
            .iter()
            .find(|f| f.factor == Factor::FoodPrices)
            .unwrap();
        assert_eq!(food.difference, 15.0);

        assert_eq!(comparison.results.len(), MetricKind::ALL.len());
        let cost = comparison
            .results
            .iter()
            .find(|m| m.metric == MetricKind::CostPerMeal)
            .unwrap();
        assert!(cost.difference > 0.0);
        assert!(cost.left_formatted.starts_with("EGP"));
    }

    #[test]
    fn test_compare_identical_scenarios_has_no_difference() {
        let baseline = BaselineMetrics::fy2024_25();
        let factors = ScenarioFactors::default().with(Factor::DonorSentiment, 10.0);

        let comparison = compare(&dto(1, factors), &dto(2, factors), |d| {
            calculate_scenario(&baseline, &d.scenario_data)
        });

        assert!(comparison.factors.iter().all(|f| f.difference == 0.0));
        assert!(comparison.results.iter().all(|m| m.difference == 0.0));
    }
}
