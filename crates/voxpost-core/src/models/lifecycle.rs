use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use crate::lifecycle::DeletionCountdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "file_type", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Audio,
    Video,
}

/// Transcription progress as tracked on both the transcription row and its
/// lifecycle row. The two are kept in step inside one transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "transcription_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Retention record for one uploaded file. The row survives physical
/// deletion as an audit trail: `file_path` goes `None` and `deleted_at`
/// is stamped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct FileLifecycleRecord {
    pub id: Uuid,
    pub recording_id: Uuid,
    pub file_path: Option<String>,
    pub file_type: FileType,
    pub file_size: i64,
    pub uploaded_at: DateTime<Utc>,
    pub transcription_status: TranscriptionStatus,
    pub transcription_id: Option<Uuid>,
    pub deletion_scheduled_at: DateTime<Utc>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub deleted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl FileLifecycleRecord {
    /// Whether the physical file is still on disk.
    pub fn file_present(&self) -> bool {
        self.file_path.is_some() && self.deleted_at.is_none()
    }

    /// Whether a failed transcription may still be retried.
    pub fn can_retry(&self) -> bool {
        self.transcription_status == TranscriptionStatus::Failed
            && self.retry_count < self.max_retries
            && self.file_present()
    }
}

/// Lifecycle state as surfaced to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct FileLifecycleInfo {
    pub file_present: bool,
    pub file_type: FileType,
    pub file_size: i64,
    pub transcription_status: TranscriptionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription_id: Option<Uuid>,
    pub deletion_scheduled_at: DateTime<Utc>,
    pub countdown: DeletionCountdown,
    pub retry_count: i32,
    pub max_retries: i32,
    pub can_retry: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl FileLifecycleInfo {
    pub fn from_record(record: &FileLifecycleRecord, now: DateTime<Utc>) -> Self {
        Self {
            file_present: record.file_present(),
            file_type: record.file_type,
            file_size: record.file_size,
            transcription_status: record.transcription_status,
            transcription_id: record.transcription_id,
            deletion_scheduled_at: record.deletion_scheduled_at,
            countdown: DeletionCountdown::until(record.deletion_scheduled_at, now),
            retry_count: record.retry_count,
            max_retries: record.max_retries,
            can_retry: record.can_retry(),
            deleted_at: record.deleted_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record() -> FileLifecycleRecord {
        let now = Utc::now();
        FileLifecycleRecord {
            id: Uuid::new_v4(),
            recording_id: Uuid::new_v4(),
            file_path: Some("users/u1/recordings/r1.mp3".into()),
            file_type: FileType::Audio,
            file_size: 1024,
            uploaded_at: now,
            transcription_status: TranscriptionStatus::Pending,
            transcription_id: None,
            deletion_scheduled_at: now + Duration::days(7),
            retry_count: 0,
            max_retries: 3,
            deleted_at: None,
            updated_at: now,
        }
    }

    #[test]
    fn test_can_retry_requires_failed_status() {
        let mut r = record();
        assert!(!r.can_retry());
        r.transcription_status = TranscriptionStatus::Failed;
        assert!(r.can_retry());
    }

    #[test]
    fn test_can_retry_denied_at_cap() {
        let mut r = record();
        r.transcription_status = TranscriptionStatus::Failed;
        r.retry_count = 3;
        assert!(!r.can_retry());
    }

    #[test]
    fn test_can_retry_denied_without_file() {
        let mut r = record();
        r.transcription_status = TranscriptionStatus::Failed;
        r.file_path = None;
        assert!(!r.can_retry());
    }

    #[test]
    fn test_info_reflects_deleted_file() {
        let mut r = record();
        r.file_path = None;
        r.deleted_at = Some(Utc::now());
        let info = FileLifecycleInfo::from_record(&r, Utc::now());
        assert!(!info.file_present);
        assert!(info.deleted_at.is_some());
    }
}
