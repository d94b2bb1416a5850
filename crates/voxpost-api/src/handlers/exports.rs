//! Export endpoints: generate platform content from completed transcripts.

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
use validator::Validate;
use voxpost_core::models::{
    ExportFormat, ExportResponse, PageQuery, PaginationResponse, UsageAction,
};
use voxpost_core::AppError;
use voxpost_services::ExportOptions;

use crate::auth::AuthContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateExportRequest {
    pub transcription_id: Uuid,
    pub format: ExportFormat,
    #[serde(default)]
    pub options: Option<ExportRequestOptions>,
}

/// Per-format generation knobs, all optional.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ExportRequestOptions {
    pub max_length: Option<usize>,
    pub include_hashtags: Option<bool>,
    pub include_hook: Option<bool>,
    pub include_outro: Option<bool>,
    pub title: Option<String>,
}

impl From<ExportRequestOptions> for ExportOptions {
    fn from(o: ExportRequestOptions) -> Self {
        ExportOptions {
            max_length: o.max_length,
            include_hashtags: o.include_hashtags,
            include_hook: o.include_hook,
            include_outro: o.include_outro,
            title: o.title,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportFilter {
    pub format: Option<ExportFormat>,
    pub transcription_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportListResponse {
    pub exports: Vec<ExportResponse>,
    pub pagination: PaginationResponse,
}

#[utoipa::path(
    post,
    path = "/api/exports",
    tag = "exports",
    request_body = CreateExportRequest,
    responses(
        (status = 201, description = "Export generated", body = ExportResponse),
        (status = 402, description = "Daily export limit exceeded", body = ErrorResponse),
        (status = 404, description = "Transcription not found", body = ErrorResponse),
        (status = 409, description = "Transcription is not completed", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, request), fields(user_id = %auth.user.id))]
pub async fn create_export(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    ValidatedJson(request): ValidatedJson<CreateExportRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .services
        .quota
        .consume(&auth.user, UsageAction::Export)
        .await?;

    let options: ExportOptions = request.options.unwrap_or_default().into();

    let export = state
        .services
        .exports
        .create(auth.user.id, request.transcription_id, request.format, &options)
        .await?;

    Ok((StatusCode::CREATED, Json(ExportResponse::from(export))))
}

#[utoipa::path(
    get,
    path = "/api/exports",
    tag = "exports",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based)"),
        ("limit" = Option<i64>, Query, description = "Items per page (max 100)"),
        ("format" = Option<ExportFormat>, Query, description = "Filter by format"),
        ("transcription_id" = Option<Uuid>, Query, description = "Filter by transcription")
    ),
    responses(
        (status = 200, description = "Exports for the current user", body = ExportListResponse)
    )
)]
pub async fn list_exports(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Query(page): Query<PageQuery>,
    Query(filter): Query<ExportFilter>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (exports, total) = state
        .db
        .exports
        .list(auth.user.id, &page, filter.format, filter.transcription_id)
        .await?;

    Ok(Json(ExportListResponse {
        exports: exports.into_iter().map(ExportResponse::from).collect(),
        pagination: PaginationResponse::new(&page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/api/exports/{id}",
    tag = "exports",
    params(("id" = Uuid, Path, description = "Export id")),
    responses(
        (status = 200, description = "Export detail", body = ExportResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_export(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let export = state
        .db
        .exports
        .get(id, auth.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Export not found".to_string()))?;

    Ok(Json(ExportResponse::from(export)))
}
