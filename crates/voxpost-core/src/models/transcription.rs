use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

use super::lifecycle::TranscriptionStatus;

/// Transcript produced for a recording by an AI provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Transcription {
    pub id: Uuid,
    pub recording_id: Uuid,
    pub user_id: Uuid,
    pub text: Option<String>,
    pub confidence_score: Option<f64>,
    pub language: String,
    pub word_count: Option<i32>,
    pub ai_service: String,
    pub status: TranscriptionStatus,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TranscriptionResponse {
    pub id: Uuid,
    pub recording_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<i32>,
    pub ai_service: String,
    pub status: TranscriptionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Transcription> for TranscriptionResponse {
    fn from(t: Transcription) -> Self {
        Self {
            id: t.id,
            recording_id: t.recording_id,
            text: t.text,
            confidence_score: t.confidence_score,
            language: t.language,
            word_count: t.word_count,
            ai_service: t.ai_service,
            status: t.status,
            error_message: t.error_message,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}
