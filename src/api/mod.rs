//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api`:
//! - Auth endpoints (register, login, current user)
//! - Notice endpoints
//! - Club and department endpoints
//! - User administration and club membership
//! - Club application endpoints
//!
//! Stored attachments are served read-only under `/uploads`.

pub mod auth;
pub mod club_applications;
pub mod clubs;
pub mod common;
pub mod departments;
pub mod middleware;
pub mod notices;
pub mod responses;
pub mod users;


use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::services::upload::UPLOADS_URL_PREFIX;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Room for multipart framing and text fields next to the attachment
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .merge(notices::admin_routes())
        .merge(clubs::admin_routes())
        .merge(departments::admin_routes())
        .merge(users::admin_routes())
        .merge(club_applications::admin_routes())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Posting routes (need the posting privilege)
    let poster_routes = Router::new()
        .merge(notices::poster_routes())
        .route_layer(axum_middleware::from_fn(middleware::require_poster))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth only)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .merge(notices::protected_routes())
        .merge(users::protected_routes())
        .merge(club_applications::protected_routes())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .nest("/auth", auth::public_router())
        .merge(clubs::public_routes())
        .merge(departments::public_routes())
        .merge(admin_routes)
        .merge(poster_routes)
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = match cors_origin {
        "*" => CorsLayer::new().allow_origin(Any),
        origin => match origin.parse::<HeaderValue>() {
            Ok(origin) => CorsLayer::new().allow_origin(origin),
            Err(_) => {
                tracing::warn!(cors_origin = origin, "Invalid CORS origin, allowing any");
                CorsLayer::new().allow_origin(Any)
            }
        },
    }
    .allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
    ])
    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let body_limit = usize::try_from(state.upload_config.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(FORM_OVERHEAD_BYTES);

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .nest_service(UPLOADS_URL_PREFIX, ServeDir::new(&state.upload_config.path))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
