use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::lifecycle::FileLifecycleInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "recording_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    Uploading,
    Processing,
    Ready,
    Failed,
    Deleted,
}

/// An uploaded voice or video recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Recording {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub file_name: String,
    pub file_size: i64,
    pub format: String,
    pub status: RecordingStatus,
    pub uploaded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Recording as returned by the API, with its retention info joined in
/// when a lifecycle row exists.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordingResponse {
    pub id: Uuid,
    pub title: String,
    pub file_name: String,
    pub file_size: i64,
    pub format: String,
    pub status: RecordingStatus,
    pub uploaded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<FileLifecycleInfo>,
}

impl RecordingResponse {
    pub fn from_recording(recording: Recording, lifecycle: Option<FileLifecycleInfo>) -> Self {
        Self {
            id: recording.id,
            title: recording.title,
            file_name: recording.file_name,
            file_size: recording.file_size,
            format: recording.format,
            status: recording.status,
            uploaded_at: recording.uploaded_at,
            created_at: recording.created_at,
            lifecycle,
        }
    }
}
