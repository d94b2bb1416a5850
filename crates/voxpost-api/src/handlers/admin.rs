//! Admin endpoints.
//!
//! Operational escape hatches guarded by a static token, outside the JWT
//! middleware. Currently just the manual cleanup trigger.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use voxpost_core::AppError;

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

fn verify_admin_token(headers: &HeaderMap, expected: Option<&str>) -> Result<(), AppError> {
    let expected = expected
        .ok_or_else(|| AppError::Internal("Admin API token is not configured".to_string()))?;

    let provided = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing admin token".to_string()))?;

    if provided.as_bytes().ct_eq(expected.as_bytes()).into() {
        Ok(())
    } else {
        Err(AppError::Unauthorized("Invalid admin token".to_string()))
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/cleanup",
    tag = "admin",
    responses(
        (status = 200, description = "Sweep finished, or skipped because one was already running"),
        (status = 401, description = "Missing or invalid admin token", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, headers))]
pub async fn trigger_cleanup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpAppError> {
    verify_admin_token(&headers, state.config.admin_api_token.as_deref())?;

    match state.services.cleanup.run_sweep().await? {
        Some(report) => Ok((
            StatusCode::OK,
            Json(json!({
                "skipped": false,
                "report": report,
            })),
        )),
        // Another sweep (scheduled or manual) already holds the guard.
        None => Ok((StatusCode::OK, Json(json!({ "skipped": true })))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_verify_admin_token_accepts_match() {
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("tok"));
        assert!(verify_admin_token(&headers, Some("tok")).is_ok());
    }

    #[test]
    fn test_verify_admin_token_rejects_mismatch() {
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_static("nope"));
        assert!(matches!(
            verify_admin_token(&headers, Some("tok")),
            Err(AppError::Unauthorized(_))
        ));
    }
}
