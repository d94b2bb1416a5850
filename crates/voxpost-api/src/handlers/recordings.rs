//! Recording endpoints: upload, listing, lifecycle status, and deletion.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;
use uuid::Uuid;
use voxpost_core::lifecycle::initial_deletion_schedule;
use voxpost_core::models::{
    FileLifecycleInfo, FileType, PageQuery, PaginationResponse, RecordingResponse, RecordingStatus,
    UsageAction,
};
use voxpost_core::AppError;
use voxpost_storage::recording_key;

use crate::auth::AuthContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordingListResponse {
    pub recordings: Vec<RecordingResponse>,
    pub pagination: PaginationResponse,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRecordingRequest {
    #[validate(length(min = 1, max = 500, message = "title must be 1-500 characters"))]
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordingFilter {
    pub status: Option<RecordingStatus>,
}

struct UploadedFile {
    file_name: String,
    data: Vec<u8>,
}

struct UploadFields {
    title: Option<String>,
    file: Option<UploadedFile>,
}

async fn read_multipart(
    multipart: &mut Multipart,
    max_size: usize,
) -> Result<UploadFields, AppError> {
    let mut fields = UploadFields {
        title: None,
        file: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("title") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Invalid title field: {e}")))?;
                fields.title = Some(value);
            }
            Some("file") => {
                let file_name = field
                    .file_name()
                    .map(String::from)
                    .ok_or_else(|| AppError::InvalidInput("File name is required".to_string()))?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read file: {e}")))?
                    .to_vec();
                if data.is_empty() {
                    return Err(AppError::InvalidInput("File is empty".to_string()));
                }
                if data.len() > max_size {
                    return Err(AppError::PayloadTooLarge(format!(
                        "{} bytes exceeds max {} bytes",
                        data.len(),
                        max_size
                    )));
                }
                fields.file = Some(UploadedFile { file_name, data });
            }
            _ => {}
        }
    }

    Ok(fields)
}

fn classify_extension(
    file_name: &str,
    audio_extensions: &[String],
    video_extensions: &[String],
) -> Result<(String, FileType), AppError> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .ok_or_else(|| {
            AppError::InvalidInput(format!("Missing file extension (filename: {file_name})"))
        })?;

    if audio_extensions.contains(&extension) {
        Ok((extension, FileType::Audio))
    } else if video_extensions.contains(&extension) {
        Ok((extension, FileType::Video))
    } else {
        Err(AppError::InvalidInput(format!(
            "Invalid extension '{}', allowed: {:?} (audio) or {:?} (video)",
            extension, audio_extensions, video_extensions
        )))
    }
}

#[utoipa::path(
    post,
    path = "/api/recordings",
    tag = "recordings",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Recording created", body = RecordingResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 402, description = "Daily recording limit exceeded", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(user_id = %auth.user.id, operation = "upload_recording"))]
pub async fn upload_recording(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let fields = read_multipart(&mut multipart, state.upload.max_upload_size_bytes).await?;
    let file = fields
        .file
        .ok_or_else(|| AppError::InvalidInput("Audio file is required".to_string()))?;

    let (extension, file_type) = classify_extension(
        &file.file_name,
        &state.upload.audio_allowed_extensions,
        &state.upload.video_allowed_extensions,
    )?;

    // Quota is consumed before any side effects; a rejected request leaves
    // no orphan rows or files.
    state
        .services
        .quota
        .consume(&auth.user, UsageAction::Recording)
        .await?;

    let title = fields
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| file.file_name.clone());
    let file_size = file.data.len() as i64;

    let recording = state
        .db
        .recordings
        .create(auth.user.id, &title, &file.file_name, file_size, &extension)
        .await?;

    let storage_key = recording_key(auth.user.id, recording.id, &extension);
    state.upload.storage.upload(&storage_key, file.data).await?;

    let deletion_scheduled_at =
        initial_deletion_schedule(Utc::now(), state.config.retention_days);
    let lifecycle = state
        .db
        .lifecycle
        .create(
            recording.id,
            &storage_key,
            file_type,
            file_size,
            deletion_scheduled_at,
            state.config.max_transcription_retries,
        )
        .await?;

    let recording = state
        .db
        .recordings
        .update_status(recording.id, RecordingStatus::Ready)
        .await?
        .ok_or_else(|| AppError::Internal("Recording vanished during upload".to_string()))?;

    tracing::info!(
        recording_id = %recording.id,
        file_size,
        deletion_scheduled_at = %deletion_scheduled_at,
        "Recording uploaded"
    );

    let info = FileLifecycleInfo::from_record(&lifecycle, Utc::now());
    Ok((
        StatusCode::CREATED,
        Json(RecordingResponse::from_recording(recording, Some(info))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/recordings",
    tag = "recordings",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based)"),
        ("limit" = Option<i64>, Query, description = "Items per page (max 100)"),
        ("status" = Option<RecordingStatus>, Query, description = "Filter by status")
    ),
    responses(
        (status = 200, description = "Recordings for the current user", body = RecordingListResponse)
    )
)]
pub async fn list_recordings(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Query(page): Query<PageQuery>,
    Query(filter): Query<RecordingFilter>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (recordings, total) = state
        .db
        .recordings
        .list(auth.user.id, &page, filter.status)
        .await?;

    let mut responses = Vec::with_capacity(recordings.len());
    let now = Utc::now();
    for recording in recordings {
        let lifecycle = state.db.lifecycle.get_by_recording(recording.id).await?;
        let info = lifecycle.map(|lc| FileLifecycleInfo::from_record(&lc, now));
        responses.push(RecordingResponse::from_recording(recording, info));
    }

    Ok(Json(RecordingListResponse {
        recordings: responses,
        pagination: PaginationResponse::new(&page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/api/recordings/{id}",
    tag = "recordings",
    params(("id" = Uuid, Path, description = "Recording id")),
    responses(
        (status = 200, description = "Recording detail", body = RecordingResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_recording(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let recording = state
        .db
        .recordings
        .get(id, auth.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recording not found".to_string()))?;

    let lifecycle = state.db.lifecycle.get_by_recording(id).await?;
    let info = lifecycle.map(|lc| FileLifecycleInfo::from_record(&lc, Utc::now()));

    Ok(Json(RecordingResponse::from_recording(recording, info)))
}

#[utoipa::path(
    get,
    path = "/api/recordings/{id}/lifecycle",
    tag = "recordings",
    params(("id" = Uuid, Path, description = "Recording id")),
    responses(
        (status = 200, description = "Lifecycle status with deletion countdown", body = FileLifecycleInfo),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn get_recording_lifecycle(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    // Ownership check first; a foreign recording is a plain 404.
    state
        .db
        .recordings
        .get(id, auth.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recording not found".to_string()))?;

    let lifecycle = state
        .db
        .lifecycle
        .get_by_recording(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recording has no file".to_string()))?;

    Ok(Json(FileLifecycleInfo::from_record(&lifecycle, Utc::now())))
}

#[utoipa::path(
    patch,
    path = "/api/recordings/{id}",
    tag = "recordings",
    params(("id" = Uuid, Path, description = "Recording id")),
    request_body = UpdateRecordingRequest,
    responses(
        (status = 200, description = "Recording updated", body = RecordingResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn update_recording(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateRecordingRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty".to_string()).into());
    }

    let recording = state
        .db
        .recordings
        .update_title(id, auth.user.id, title)
        .await?
        .ok_or_else(|| AppError::NotFound("Recording not found".to_string()))?;

    Ok(Json(RecordingResponse::from_recording(recording, None)))
}

#[utoipa::path(
    delete,
    path = "/api/recordings/{id}/delete-file",
    tag = "recordings",
    params(("id" = Uuid, Path, description = "Recording id")),
    responses(
        (status = 200, description = "File deleted; transcript and metadata kept"),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %auth.user.id, recording_id = %id))]
pub async fn delete_recording_file(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .db
        .recordings
        .get(id, auth.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recording not found".to_string()))?;

    let lifecycle = state
        .db
        .lifecycle
        .get_by_recording(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recording has no file".to_string()))?;

    let Some(file_path) = lifecycle.file_path.as_deref() else {
        // Already deleted; the operation is idempotent.
        return Ok(Json(json!({ "deleted": true })));
    };

    // Pull the schedule to now first: if the process dies between the
    // storage delete and the row update, the sweeper finishes the job.
    state.db.lifecycle.schedule_immediate(id).await?;
    state.upload.storage.delete(file_path).await?;
    state.db.lifecycle.mark_deleted(lifecycle.id).await?;

    tracing::info!(file_path, "Recording file deleted on request");

    Ok(Json(json!({ "deleted": true })))
}

#[utoipa::path(
    delete,
    path = "/api/recordings/{id}",
    tag = "recordings",
    params(("id" = Uuid, Path, description = "Recording id")),
    responses(
        (status = 200, description = "Recording and all derived data deleted"),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(user_id = %auth.user.id, recording_id = %id))]
pub async fn delete_recording(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state
        .db
        .recordings
        .get(id, auth.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Recording not found".to_string()))?;

    // Physical file first; the row delete cascades to lifecycle,
    // transcriptions, and exports.
    if let Some(lifecycle) = state.db.lifecycle.get_by_recording(id).await? {
        if let Some(file_path) = lifecycle.file_path.as_deref() {
            state.upload.storage.delete(file_path).await?;
        }
    }

    let deleted = state.db.recordings.delete(id, auth.user.id).await?;
    if !deleted {
        return Err(AppError::NotFound("Recording not found".to_string()).into());
    }

    Ok(Json(json!({ "deleted": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extensions() -> (Vec<String>, Vec<String>) {
        (
            vec!["mp3".to_string(), "wav".to_string(), "m4a".to_string()],
            vec!["mp4".to_string(), "mov".to_string()],
        )
    }

    #[test]
    fn test_classify_extension_audio() {
        let (audio, video) = extensions();
        let (ext, file_type) = classify_extension("take1.MP3", &audio, &video).unwrap();
        assert_eq!(ext, "mp3");
        assert_eq!(file_type, FileType::Audio);
    }

    #[test]
    fn test_classify_extension_video() {
        let (audio, video) = extensions();
        let (ext, file_type) = classify_extension("clip.mov", &audio, &video).unwrap();
        assert_eq!(ext, "mov");
        assert_eq!(file_type, FileType::Video);
    }

    #[test]
    fn test_classify_extension_unknown() {
        let (audio, video) = extensions();
        assert!(matches!(
            classify_extension("notes.txt", &audio, &video),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_classify_extension_missing() {
        let (audio, video) = extensions();
        assert!(matches!(
            classify_extension("noextension", &audio, &video),
            Err(AppError::InvalidInput(_))
        ));
    }
}
