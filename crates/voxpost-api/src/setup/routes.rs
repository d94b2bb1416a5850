//! Route table and middleware stack.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::api_doc::ApiDoc;
use crate::auth::{auth_middleware, AuthState};
use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>, auth_state: Arc<AuthState>) -> Router {
    // Routes that authenticate themselves (shared secrets) or not at all.
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route(
            "/api/webhooks/billing",
            post(handlers::webhooks::billing_webhook),
        )
        .route("/api/admin/cleanup", post(handlers::admin::trigger_cleanup));

    let protected_routes = Router::new()
        .route(
            "/api/recordings",
            post(handlers::recordings::upload_recording).get(handlers::recordings::list_recordings),
        )
        .route(
            "/api/recordings/{id}",
            get(handlers::recordings::get_recording)
                .patch(handlers::recordings::update_recording)
                .delete(handlers::recordings::delete_recording),
        )
        .route(
            "/api/recordings/{id}/lifecycle",
            get(handlers::recordings::get_recording_lifecycle),
        )
        .route(
            "/api/recordings/{id}/delete-file",
            delete(handlers::recordings::delete_recording_file),
        )
        .route(
            "/api/recordings/{id}/transcribe",
            post(handlers::transcriptions::start_transcription),
        )
        .route(
            "/api/transcriptions",
            get(handlers::transcriptions::list_transcriptions),
        )
        .route(
            "/api/transcriptions/{id}",
            get(handlers::transcriptions::get_transcription),
        )
        .route(
            "/api/transcriptions/{id}/retry",
            post(handlers::transcriptions::retry_transcription),
        )
        .route(
            "/api/transcriptions/{id}/lifecycle",
            get(handlers::transcriptions::get_transcription_lifecycle),
        )
        .route(
            "/api/exports",
            post(handlers::exports::create_export).get(handlers::exports::list_exports),
        )
        .route("/api/exports/{id}", get(handlers::exports::get_export))
        .route(
            "/api/subscriptions",
            get(handlers::subscriptions::get_subscription),
        )
        .route(
            "/api/subscriptions/usage",
            get(handlers::subscriptions::get_usage),
        )
        .layer(from_fn_with_state(auth_state, auth_middleware));

    let cors = cors_layer(&state.config.cors_origins);
    let max_body = state.config.max_upload_size_bytes;

    public_routes
        .merge(protected_routes)
        // Multipart sizes are checked per-field too; these bound the raw body.
        .layer(DefaultBodyLimit::max(max_body))
        .layer(RequestBodyLimitLayer::new(max_body))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
