use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use common::UserId;
use common::preferences::{
    DisplaySettings, NotificationSettings, UpdatePreferencesRequest, UserPreferencesDto,
    default_favorite_sections, toggle_membership,
};
use model::entities::user_preference;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::{debug, info, instrument, trace};

use crate::helpers::converters::{preferences_to_dto, to_json_column};
use crate::schemas::{
    ApiError, ApiResponse, AppState, ErrorResponse, conversion_error, database_error,
    parse_user_id,
};

fn json_column<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    to_json_column(value).map_err(conversion_error)
}

/// Returns the stored preferences, inserting the defaults on first access.
async fn load_or_create(
    db: &DatabaseConnection,
    user_id: &UserId,
) -> Result<user_preference::Model, ApiError> {
    let existing = user_preference::Entity::find()
        .filter(user_preference::Column::UserId.eq(user_id.as_str()))
        .one(db)
        .await
        .map_err(|e| database_error("load preferences", e))?;

    if let Some(model) = existing {
        return Ok(model);
    }

    debug!("Creating default preferences for {}", user_id);
    let timestamp = Utc::now().naive_utc();
    user_preference::ActiveModel {
        user_id: Set(user_id.to_string()),
        pinned_metrics: Set(json_column(&Vec::<String>::new())?),
        favorite_sections: Set(json_column(&default_favorite_sections())?),
        notification_settings: Set(json_column(&NotificationSettings::default())?),
        display_settings: Set(json_column(&DisplaySettings::default())?),
        created_at: Set(timestamp),
        updated_at: Set(timestamp),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| database_error("create default preferences", e))
}

/// Writes the list fields of `dto` back into the row.
async fn store(
    db: &DatabaseConnection,
    model: user_preference::Model,
    dto: &UserPreferencesDto,
) -> Result<UserPreferencesDto, ApiError> {
    let mut active: user_preference::ActiveModel = model.into();
    active.pinned_metrics = Set(json_column(&dto.pinned_metrics)?);
    active.favorite_sections = Set(json_column(&dto.favorite_sections)?);
    active.notification_settings = Set(json_column(&dto.notification_settings)?);
    active.display_settings = Set(json_column(&dto.display_settings)?);
    active.updated_at = Set(Utc::now().naive_utc());

    let model = active
        .update(db)
        .await
        .map_err(|e| database_error("update preferences", e))?;
    preferences_to_dto(model).map_err(conversion_error)
}

/// Get preferences
///
/// A user without stored preferences gets the defaults, which are persisted.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/preferences",
    tag = "preferences",
    params(("user_id" = String, Path, description = "Opaque user id")),
    responses(
        (status = 200, description = "Preferences", body = ApiResponse<UserPreferencesDto>),
        (status = 400, description = "Invalid user id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_preferences(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserPreferencesDto>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering get_preferences function");
    let user_id = parse_user_id(&user_id)?;

    let model = load_or_create(&state.db, &user_id).await?;
    let dto = preferences_to_dto(model).map_err(conversion_error)?;
    Ok(Json(ApiResponse::ok(dto, "Preferences retrieved successfully")))
}

/// Update preferences
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/preferences",
    tag = "preferences",
    params(("user_id" = String, Path, description = "Opaque user id")),
    request_body = UpdatePreferencesRequest,
    responses(
        (status = 200, description = "Preferences updated", body = ApiResponse<UserPreferencesDto>),
        (status = 400, description = "Invalid user id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_preferences(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<UpdatePreferencesRequest>,
) -> Result<Json<ApiResponse<UserPreferencesDto>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering update_preferences function");
    let user_id = parse_user_id(&user_id)?;

    let model = load_or_create(&state.db, &user_id).await?;
    let mut dto = preferences_to_dto(model.clone()).map_err(conversion_error)?;

    if let Some(pinned) = request.pinned_metrics {
        dto.pinned_metrics = pinned;
    }
    if let Some(sections) = request.favorite_sections {
        dto.favorite_sections = sections;
    }
    if let Some(settings) = request.notification_settings {
        dto.notification_settings = settings;
    }
    if let Some(settings) = request.display_settings {
        dto.display_settings = settings;
    }

    let dto = store(&state.db, model, &dto).await?;
    info!("Updated preferences for {}", user_id);
    Ok(Json(ApiResponse::ok(dto, "Preferences updated successfully")))
}

/// Pin or unpin a metric
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/preferences/pinned-metrics/{metric}",
    tag = "preferences",
    params(
        ("user_id" = String, Path, description = "Opaque user id"),
        ("metric" = String, Path, description = "Metric key"),
    ),
    responses(
        (status = 200, description = "Pinned metrics toggled", body = ApiResponse<UserPreferencesDto>),
        (status = 400, description = "Invalid user id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn toggle_pinned_metric(
    Path((user_id, metric)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserPreferencesDto>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering toggle_pinned_metric function");
    let user_id = parse_user_id(&user_id)?;

    let model = load_or_create(&state.db, &user_id).await?;
    let mut dto = preferences_to_dto(model.clone()).map_err(conversion_error)?;
    toggle_membership(&mut dto.pinned_metrics, &metric);

    let dto = store(&state.db, model, &dto).await?;
    debug!("Pinned metrics of {} now {:?}", user_id, dto.pinned_metrics);
    Ok(Json(ApiResponse::ok(dto, "Pinned metric toggled successfully")))
}

/// Add or remove a favorite dashboard section
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/preferences/favorite-sections/{section}",
    tag = "preferences",
    params(
        ("user_id" = String, Path, description = "Opaque user id"),
        ("section" = String, Path, description = "Dashboard section key"),
    ),
    responses(
        (status = 200, description = "Favorite sections toggled", body = ApiResponse<UserPreferencesDto>),
        (status = 400, description = "Invalid user id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn toggle_favorite_section(
    Path((user_id, section)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<UserPreferencesDto>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering toggle_favorite_section function");
    let user_id = parse_user_id(&user_id)?;

    let model = load_or_create(&state.db, &user_id).await?;
    let mut dto = preferences_to_dto(model.clone()).map_err(conversion_error)?;
    toggle_membership(&mut dto.favorite_sections, &section);

    let dto = store(&state.db, model, &dto).await?;
    debug!("Favorite sections of {} now {:?}", user_id, dto.favorite_sections);
    Ok(Json(ApiResponse::ok(dto, "Favorite section toggled successfully")))
}
