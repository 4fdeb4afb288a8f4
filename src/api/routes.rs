//! Router configuration for the API.
//!
//! This module provides centralized route registration and middleware
//! configuration for the application.

use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::doc::ApiDoc;
use crate::api::handlers;
use crate::api::middleware::{global_error_handler, logging_middleware, request_id_middleware};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// # Routes
/// - `/api/users` - profile endpoints
/// - `/health` - liveness check
/// - `/uploads` (configurable) - stored profile pictures
/// - `/swagger-ui`, `/api-docs/openapi.json` - API documentation
///
/// # Middleware Order
/// Last added runs first: request ID, then logging, then CORS and
/// compression. Error rewriting sits closest to the routes so it reads
/// uncompressed bodies and its JSON output is compressed like any other.
pub fn create_router(state: AppState) -> Router {
    let (api_router, openapi) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest(
            "/api/users",
            handlers::users::user_routes(state.uploads.max_file_size()),
        )
        .merge(handlers::health::health_routes())
        .split_for_parts();

    let uploads = ServeDir::new(state.uploads.directory());
    let public_path = state.uploads.public_path().to_string();

    api_router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .nest_service(&public_path, uploads)
        .layer(middleware::from_fn(global_error_handler))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
