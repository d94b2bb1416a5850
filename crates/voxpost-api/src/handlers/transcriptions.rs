//! Transcription endpoints: start, list, fetch, and retry.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use chrono::Utc;
use voxpost_core::models::{
    FileLifecycleInfo, PageQuery, PaginationResponse, TranscriptionResponse, TranscriptionStatus,
    UsageAction,
};
use voxpost_core::AppError;

use crate::auth::AuthContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct StartTranscriptionQuery {
    /// BCP-47 language hint, or "auto" to let the provider detect.
    pub language: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TranscriptionListResponse {
    pub transcriptions: Vec<TranscriptionResponse>,
    pub pagination: PaginationResponse,
}

#[derive(Debug, Default, Deserialize)]
pub struct TranscriptionFilter {
    pub status: Option<TranscriptionStatus>,
}

#[utoipa::path(
    post,
    path = "/api/recordings/{id}/transcribe",
    tag = "transcriptions",
    params(
        ("id" = Uuid, Path, description = "Recording id"),
        ("language" = Option<String>, Query, description = "BCP-47 language hint, default auto")
    ),
    responses(
        (status = 202, description = "Transcription started", body = TranscriptionResponse),
        (status = 402, description = "Daily transcription limit exceeded", body = ErrorResponse),
        (status = 404, description = "Recording not found", body = ErrorResponse),
        (status = 409, description = "Recording is not transcribable", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, query), fields(user_id = %auth.user.id, recording_id = %id))]
pub async fn start_transcription(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    Query(query): Query<StartTranscriptionQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let language = query
        .language
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| "auto".to_string());

    // A request that would be rejected (missing recording, wrong state) must
    // not burn a daily transcription unit, so preconditions come first.
    state
        .services
        .orchestrator
        .check_startable(id, auth.user.id)
        .await?;

    state
        .services
        .quota
        .consume(&auth.user, UsageAction::Transcription)
        .await?;

    let transcription = state
        .services
        .orchestrator
        .start(id, auth.user.id, &language)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(TranscriptionResponse::from(transcription)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/transcriptions",
    tag = "transcriptions",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based)"),
        ("limit" = Option<i64>, Query, description = "Items per page (max 100)"),
        ("status" = Option<TranscriptionStatus>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "Transcriptions for the current user", body = TranscriptionListResponse)
    )
)]
pub async fn list_transcriptions(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Query(page): Query<PageQuery>,
    Query(filter): Query<TranscriptionFilter>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (transcriptions, total) = state
        .db
        .transcriptions
        .list(auth.user.id, &page, filter.status)
        .await?;

    Ok(Json(TranscriptionListResponse {
        transcriptions: transcriptions
            .into_iter()
            .map(TranscriptionResponse::from)
            .collect(),
        pagination: PaginationResponse::new(&page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/api/transcriptions/{id}",
    tag = "transcriptions",
    params(("id" = Uuid, Path, description = "Transcription id")),
    responses(
        (status = 200, description = "Transcription detail", body = TranscriptionResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_transcription(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let transcription = state
        .db
        .transcriptions
        .get(id, auth.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transcription not found".to_string()))?;

    Ok(Json(TranscriptionResponse::from(transcription)))
}

#[utoipa::path(
    get,
    path = "/api/transcriptions/{id}/lifecycle",
    tag = "transcriptions",
    params(("id" = Uuid, Path, description = "Transcription id")),
    responses(
        (status = 200, description = "Lifecycle status of the underlying recording", body = FileLifecycleInfo),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_transcription_lifecycle(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let transcription = state
        .db
        .transcriptions
        .get(id, auth.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Transcription not found".to_string()))?;

    let lifecycle = state
        .db
        .lifecycle
        .get_by_recording(transcription.recording_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recording has no file".to_string()))?;

    Ok(Json(FileLifecycleInfo::from_record(&lifecycle, Utc::now())))
}

#[utoipa::path(
    post,
    path = "/api/transcriptions/{id}/retry",
    tag = "transcriptions",
    params(("id" = Uuid, Path, description = "Transcription id")),
    responses(
        (status = 202, description = "Retry started", body = TranscriptionResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Retry budget exhausted or wrong state", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %auth.user.id, transcription_id = %id))]
pub async fn retry_transcription(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let transcription = state.services.orchestrator.retry(id, auth.user.id).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(TranscriptionResponse::from(transcription)),
    ))
}
