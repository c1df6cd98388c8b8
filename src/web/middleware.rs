//! Middleware for the Web API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN},
    http::{HeaderValue, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::cors::{Any, CorsLayer};

use super::error::ApiError;
use super::handlers::AppState;
use crate::rate_limit::RateLimitResult;

/// Create a CORS layer from configuration.
///
/// With no origins configured (dev mode) any origin is allowed without
/// credentials; with origins configured only those are allowed.
pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if origins.is_empty() {
        return CorsLayer::new()
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_origin(Any);
    }

    let parsed_origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

    if parsed_origins.is_empty() {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers(Any)
            .allow_origin(Any)
    } else {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
            .allow_credentials(true)
            .allow_origin(parsed_origins)
    }
}

/// Reject requests whose Origin header is not in the allow-list.
///
/// Requests without an Origin header (server-to-server) pass through.
pub async fn origin_check(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.allowed_origins.is_empty() {
        if let Some(origin) = request.headers().get(ORIGIN) {
            let allowed = origin
                .to_str()
                .map(|o| state.allowed_origins.iter().any(|a| a == o))
                .unwrap_or(false);

            if !allowed {
                return ApiError::unauthorized("origin not allowed").into_response();
            }
        }
    }

    next.run(request).await
}

/// Resolve the client key used for rate limiting.
///
/// Prefers `X-Forwarded-For` (first hop), then the peer address.
fn client_key(request: &Request<Body>) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Enforce the per-client upload rate limit.
pub async fn upload_rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = client_key(&request);

    match state.upload_limiter.check_and_record(&client) {
        RateLimitResult::Allowed => next.run(request).await,
        RateLimitResult::Denied { retry_after } => {
            tracing::warn!(client = %client, "upload rate limit exceeded");
            ApiError::too_many_requests(format!(
                "too many uploads, retry in {} seconds",
                retry_after.as_secs().max(1)
            ))
            .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_cors_layer_empty_origins() {
        let _layer = create_cors_layer(&[]);
    }

    #[test]
    fn test_create_cors_layer_with_origins() {
        let origins = vec!["http://localhost:3000".to_string()];
        let _layer = create_cors_layer(&origins);
    }

    #[test]
    fn test_client_key_prefers_forwarded_header() {
        let request = Request::builder()
            .header("x-forwarded-for", "10.0.0.1, 10.0.0.2")
            .body(Body::empty())
            .unwrap();

        assert_eq!(client_key(&request), "10.0.0.1");
    }

    #[test]
    fn test_client_key_without_peer_info() {
        let request = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&request), "unknown");
    }
}
