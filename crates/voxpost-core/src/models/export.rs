use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Target platform for generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "export_format", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Twitter,
    Twitlonger,
    Youtube,
    Tiktok,
    Blog,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Twitter,
        ExportFormat::Twitlonger,
        ExportFormat::Youtube,
        ExportFormat::Tiktok,
        ExportFormat::Blog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Twitter => "twitter",
            ExportFormat::Twitlonger => "twitlonger",
            ExportFormat::Youtube => "youtube",
            ExportFormat::Tiktok => "tiktok",
            ExportFormat::Blog => "blog",
        }
    }
}

/// Platform-ready content generated from a transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Export {
    pub id: Uuid,
    pub transcription_id: Uuid,
    pub user_id: Uuid,
    pub format: ExportFormat,
    pub content: String,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ExportResponse {
    pub id: Uuid,
    pub transcription_id: Uuid,
    pub format: ExportFormat,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<Export> for ExportResponse {
    fn from(e: Export) -> Self {
        Self {
            id: e.id,
            transcription_id: e.transcription_id,
            format: e.format,
            content: e.content,
            metadata: e.metadata,
            created_at: e.created_at,
        }
    }
}
