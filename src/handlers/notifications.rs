use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDateTime, Utc};
use common::UserId;
use common::notifications::{CreateNotificationRequest, NotificationDto, NotificationListDto};
use model::entities::notification;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::helpers::converters::{
    category_to_entity, kind_to_entity, notification_to_dto, priority_to_entity,
};
use crate::schemas::{
    ApiError, ApiResponse, AppState, ErrorResponse, api_error, conversion_error, database_error,
    parse_user_id,
};

/// Most notifications returned by the list endpoint.
pub const ACTIVE_LIMIT: u64 = 50;

/// Not dismissed and not past `expires_at`.
fn active_for(user_id: &UserId, now: NaiveDateTime) -> Condition {
    Condition::all()
        .add(notification::Column::UserId.eq(user_id.as_str()))
        .add(notification::Column::IsDismissed.eq(false))
        .add(
            Condition::any()
                .add(notification::Column::ExpiresAt.is_null())
                .add(notification::Column::ExpiresAt.gt(now)),
        )
}

async fn find_owned(
    db: &DatabaseConnection,
    user_id: &UserId,
    notification_id: i32,
) -> Result<notification::Model, ApiError> {
    notification::Entity::find_by_id(notification_id)
        .filter(notification::Column::UserId.eq(user_id.as_str()))
        .one(db)
        .await
        .map_err(|e| database_error("load notification", e))?
        .ok_or_else(|| {
            warn!("Notification {} not found for user {}", notification_id, user_id);
            api_error(
                StatusCode::NOT_FOUND,
                "NOTIFICATION_NOT_FOUND",
                format!("Notification {} not found", notification_id),
            )
        })
}

/// List active notifications
///
/// Newest first, at most fifty, with the number of unread active ones.
#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/notifications",
    tag = "notifications",
    params(("user_id" = String, Path, description = "Opaque user id")),
    responses(
        (status = 200, description = "Active notifications", body = ApiResponse<NotificationListDto>),
        (status = 400, description = "Invalid user id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn list_notifications(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<NotificationListDto>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering list_notifications function");
    let user_id = parse_user_id(&user_id)?;
    let now = Utc::now().naive_utc();

    let rows = notification::Entity::find()
        .filter(active_for(&user_id, now))
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id)
        .limit(ACTIVE_LIMIT)
        .all(&state.db)
        .await
        .map_err(|e| database_error("list notifications", e))?;

    let unread_count = notification::Entity::find()
        .filter(active_for(&user_id, now))
        .filter(notification::Column::IsRead.eq(false))
        .count(&state.db)
        .await
        .map_err(|e| database_error("count unread notifications", e))?;

    let notifications = rows
        .into_iter()
        .map(notification_to_dto)
        .collect::<Result<Vec<_>, _>>()
        .map_err(conversion_error)?;

    debug!(
        "Retrieved {} notifications ({} unread) for {}",
        notifications.len(),
        unread_count,
        user_id
    );
    Ok(Json(ApiResponse::ok(
        NotificationListDto {
            notifications,
            unread_count,
        },
        "Notifications retrieved successfully",
    )))
}

/// Create a notification
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/notifications",
    tag = "notifications",
    params(("user_id" = String, Path, description = "Opaque user id")),
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = ApiResponse<NotificationDto>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_notification(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
    Json(request): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<NotificationDto>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering create_notification function");
    let user_id = parse_user_id(&user_id)?;

    if request.title.trim().is_empty() {
        warn!("Rejected notification without title");
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "INVALID_TITLE",
            "Notification title must not be empty",
        ));
    }

    let model = notification::ActiveModel {
        user_id: Set(user_id.to_string()),
        kind: Set(kind_to_entity(request.kind)),
        category: Set(category_to_entity(request.category)),
        title: Set(request.title),
        message: Set(request.message),
        related_metric: Set(request.related_metric),
        priority: Set(priority_to_entity(request.priority)),
        is_read: Set(false),
        is_dismissed: Set(false),
        created_at: Set(Utc::now().naive_utc()),
        read_at: Set(None),
        expires_at: Set(request.expires_at),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| database_error("create notification", e))?;

    info!("Created notification {} for {}", model.id, user_id);
    let dto = notification_to_dto(model).map_err(conversion_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(dto, "Notification created successfully")),
    ))
}

/// Mark a notification as read
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/notifications/{notification_id}/read",
    tag = "notifications",
    params(
        ("user_id" = String, Path, description = "Opaque user id"),
        ("notification_id" = i32, Path, description = "Notification id"),
    ),
    responses(
        (status = 200, description = "Notification marked read", body = ApiResponse<NotificationDto>),
        (status = 404, description = "Notification not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn mark_read(
    Path((user_id, notification_id)): Path<(String, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<NotificationDto>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering mark_read function");
    let user_id = parse_user_id(&user_id)?;

    let existing = find_owned(&state.db, &user_id, notification_id).await?;
    let model = if existing.is_read {
        debug!("Notification {} already read", notification_id);
        existing
    } else {
        let mut active: notification::ActiveModel = existing.into();
        active.is_read = Set(true);
        active.read_at = Set(Some(Utc::now().naive_utc()));
        active
            .update(&state.db)
            .await
            .map_err(|e| database_error("mark notification read", e))?
    };

    let dto = notification_to_dto(model).map_err(conversion_error)?;
    Ok(Json(ApiResponse::ok(dto, "Notification marked as read")))
}

/// Mark every notification of the user as read
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/notifications/read-all",
    tag = "notifications",
    params(("user_id" = String, Path, description = "Opaque user id")),
    responses(
        (status = 200, description = "Number of notifications marked read", body = ApiResponse<u64>),
        (status = 400, description = "Invalid user id", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn mark_all_read(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<u64>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering mark_all_read function");
    let user_id = parse_user_id(&user_id)?;

    let result = notification::Entity::update_many()
        .col_expr(notification::Column::IsRead, Expr::value(true))
        .col_expr(
            notification::Column::ReadAt,
            Expr::value(Some(Utc::now().naive_utc())),
        )
        .filter(notification::Column::UserId.eq(user_id.as_str()))
        .filter(notification::Column::IsRead.eq(false))
        .exec(&state.db)
        .await
        .map_err(|e| database_error("mark notifications read", e))?;

    info!("Marked {} notifications read for {}", result.rows_affected, user_id);
    Ok(Json(ApiResponse::ok(
        result.rows_affected,
        "All notifications marked as read",
    )))
}

/// Dismiss a notification
///
/// Dismissed notifications disappear from the active list for good.
#[utoipa::path(
    post,
    path = "/api/v1/users/{user_id}/notifications/{notification_id}/dismiss",
    tag = "notifications",
    params(
        ("user_id" = String, Path, description = "Opaque user id"),
        ("notification_id" = i32, Path, description = "Notification id"),
    ),
    responses(
        (status = 200, description = "Notification dismissed", body = ApiResponse<NotificationDto>),
        (status = 404, description = "Notification not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn dismiss(
    Path((user_id, notification_id)): Path<(String, i32)>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<NotificationDto>>, (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering dismiss function");
    let user_id = parse_user_id(&user_id)?;

    let existing = find_owned(&state.db, &user_id, notification_id).await?;
    let mut active: notification::ActiveModel = existing.into();
    active.is_dismissed = Set(true);

    let model = active
        .update(&state.db)
        .await
        .map_err(|e| database_error("dismiss notification", e))?;

    info!("Dismissed notification {} for {}", model.id, user_id);
    let dto = notification_to_dto(model).map_err(conversion_error)?;
    Ok(Json(ApiResponse::ok(dto, "Notification dismissed")))
}
