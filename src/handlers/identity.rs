use axum::{http::StatusCode, response::Json};
use chrono::Utc;
use common::user::UserIdentityDto;
use tracing::{error, info, instrument, trace};

use crate::identity::generate_user_id;
use crate::schemas::{ApiResponse, ErrorResponse, api_error};

/// Mint a user identity
///
/// Returns a fresh opaque user id. Clients keep it and pass it in the path of
/// every per-user endpoint.
#[utoipa::path(
    post,
    path = "/api/v1/users/identity",
    tag = "users",
    responses(
        (status = 201, description = "Identity created", body = ApiResponse<UserIdentityDto>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn create_identity()
-> Result<(StatusCode, Json<ApiResponse<UserIdentityDto>>), (StatusCode, Json<ErrorResponse>)> {
    trace!("Entering create_identity function");

    let user_id = generate_user_id(Utc::now(), &mut rand::thread_rng()).map_err(|e| {
        error!("Failed to mint user id: {}", e);
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "IDENTITY_ERROR",
            "Failed to create identity",
        )
    })?;

    info!("Minted user identity {}", user_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            UserIdentityDto { user_id },
            "Identity created successfully",
        )),
    ))
}
