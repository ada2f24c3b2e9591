use crate::handlers::{
    donations::{get_donation_summary, get_monthly_donations},
    health::health_check,
    identity::create_identity,
    notifications::{create_notification, dismiss, list_notifications, mark_all_read, mark_read},
    preferences::{get_preferences, toggle_favorite_section, toggle_pinned_metric, update_preferences},
    saved_scenarios::{
        compare_saved_scenarios, create_saved_scenario, delete_saved_scenario, get_saved_scenario,
        list_saved_scenarios, mark_viewed, toggle_favorite, update_saved_scenario,
    },
    scenarios::{calculate, get_baseline},
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Donation aggregates
        .route("/api/v1/donations/monthly", get(get_monthly_donations))
        .route("/api/v1/donations/summary", get(get_donation_summary))
        // Scenario calculator
        .route("/api/v1/scenarios/baseline", get(get_baseline))
        .route("/api/v1/scenarios/calculate", post(calculate))
        // Identity
        .route("/api/v1/users/identity", post(create_identity))
        // Saved scenarios
        .route(
            "/api/v1/users/:user_id/scenarios",
            get(list_saved_scenarios).post(create_saved_scenario),
        )
        .route(
            "/api/v1/users/:user_id/scenarios/compare",
            get(compare_saved_scenarios),
        )
        .route(
            "/api/v1/users/:user_id/scenarios/:scenario_id",
            get(get_saved_scenario)
                .put(update_saved_scenario)
                .delete(delete_saved_scenario),
        )
        .route(
            "/api/v1/users/:user_id/scenarios/:scenario_id/favorite",
            post(toggle_favorite),
        )
        .route(
            "/api/v1/users/:user_id/scenarios/:scenario_id/viewed",
            post(mark_viewed),
        )
        // Preferences
        .route(
            "/api/v1/users/:user_id/preferences",
            get(get_preferences).put(update_preferences),
        )
        .route(
            "/api/v1/users/:user_id/preferences/pinned-metrics/:metric",
            post(toggle_pinned_metric),
        )
        .route(
            "/api/v1/users/:user_id/preferences/favorite-sections/:section",
            post(toggle_favorite_section),
        )
        // Notifications
        .route(
            "/api/v1/users/:user_id/notifications",
            get(list_notifications).post(create_notification),
        )
        .route(
            "/api/v1/users/:user_id/notifications/read-all",
            post(mark_all_read),
        )
        .route(
            "/api/v1/users/:user_id/notifications/:notification_id/read",
            post(mark_read),
        )
        .route(
            "/api/v1/users/:user_id/notifications/:notification_id/dismiss",
            post(dismiss),
        )
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
