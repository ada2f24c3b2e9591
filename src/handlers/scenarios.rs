use axum::{extract::State, http::StatusCode, response::Json};
use common::{BaselineMetrics, CalculateScenarioRequest, CalculatedMetrics};
use compute::ScenarioModel;
use tracing::{debug, info, instrument, trace, warn};

use crate::schemas::{ApiResponse, AppState, ErrorResponse, api_error};

/// Program efficiency is a ratio (`<= 1`) or a percentage.
const MAX_PROGRAM_EFFICIENCY: f64 = 100.0;

/// Reference baseline
///
/// Operating figures every scenario is measured against unless the request
/// brings its own.
#[utoipa::path(
    get,
    path = "/api/v1/scenarios/baseline",
    tag = "scenarios",
    responses(
        (status = 200, description = "Reference baseline", body = ApiResponse<BaselineMetrics>)
    )
)]
#[instrument(skip(state))]
pub async fn get_baseline(State(state): State<AppState>) -> Json<ApiResponse<BaselineMetrics>> {
    trace!("Entering get_baseline function");
    Json(ApiResponse::ok(state.baseline, "Baseline retrieved successfully"))
}

/// Calculate a scenario
///
/// Applies the factors to the given baseline (or the reference baseline) and
/// returns adjusted metrics with their percent change.
#[utoipa::path(
    post,
    path = "/api/v1/scenarios/calculate",
    tag = "scenarios",
    request_body = CalculateScenarioRequest,
    responses(
        (status = 200, description = "Scenario calculated", body = ApiResponse<CalculatedMetrics>),
        (status = 400, description = "Invalid baseline", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn calculate(
    State(state): State<AppState>,
    Json(request): Json<CalculateScenarioRequest>,
) -> Result<Json<ApiResponse<CalculatedMetrics>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering calculate function");
    debug!("Scenario factors: {:?}", request.factors);

    let baseline = request.baseline.unwrap_or(state.baseline);
    if let Some(kind) = common::MetricKind::ALL.iter().find(|kind| {
        let value = baseline_value(&baseline, **kind);
        !value.is_finite() || value < 0.0
    }) {
        warn!("Rejected baseline with invalid {:?}", kind);
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_BASELINE",
            format!("Baseline {} must be a non-negative number", kind.label()),
        ));
    }
    if baseline.program_efficiency > MAX_PROGRAM_EFFICIENCY {
        warn!(
            "Rejected baseline with program efficiency {}",
            baseline.program_efficiency
        );
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_BASELINE",
            format!(
                "Baseline program efficiency must not exceed {}",
                MAX_PROGRAM_EFFICIENCY
            ),
        ));
    }

    let result = compute::default_model().calculate(&baseline, &request.factors);

    info!(
        "Scenario calculated: meals {:+.2}%, cost per meal {:+.2}%",
        result.meals_delivered_change, result.cost_per_meal_change
    );
    Ok(Json(ApiResponse::ok(result, "Scenario calculated successfully")))
}

fn baseline_value(baseline: &BaselineMetrics, kind: common::MetricKind) -> f64 {
    use common::MetricKind;
    match kind {
        MetricKind::MealsDelivered => baseline.meals_delivered,
        MetricKind::PeopleServed => baseline.people_served,
        MetricKind::CostPerMeal => baseline.cost_per_meal,
        MetricKind::ProgramEfficiency => baseline.program_efficiency,
        MetricKind::Revenue => baseline.revenue,
        MetricKind::Expenses => baseline.expenses,
        MetricKind::Reserves => baseline.reserves,
        MetricKind::CashPosition => baseline.cash_position,
    }
}
