//! Router configuration for the Web API.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    check_user_status, create_metadata, delete_file, delete_thumbnail, file_analytics,
    initiate_download, list_files, request_token, sync_plan, thumbnail, update_file_name, upload,
    user_plan, AppState,
};
use super::middleware::{create_cors_layer, origin_check, upload_rate_limit};

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // The upload route carries its own rate limit on top of the shared stack
    let upload_routes = Router::new()
        .route("/upload", post(upload))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            upload_rate_limit,
        ));

    let file_routes = Router::new()
        .route("/files", get(list_files))
        .route("/create-metadata", post(create_metadata))
        .route("/request-token", post(request_token))
        .route("/request/delete/:token", delete(delete_file))
        .route("/request/delete-thumbnail/:token", delete(delete_thumbnail));

    let api_routes = Router::new()
        .route("/update-file-name", post(update_file_name))
        .route("/thumbnail/:token", get(thumbnail))
        .route("/initiate-download/:token", get(initiate_download))
        .route("/file-analytics/:token", get(file_analytics))
        .route("/user-plan/:email", get(user_plan))
        .route("/ste", post(sync_plan));

    let user_routes = Router::new().route("/check-user-status", post(check_user_status));

    Router::new()
        .merge(upload_routes)
        .merge(file_routes)
        .merge(user_routes)
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(&app_state.allowed_origins))
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    origin_check,
                )),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_health_router() {
        let _router = create_health_router();
        // Should not panic
    }
}
