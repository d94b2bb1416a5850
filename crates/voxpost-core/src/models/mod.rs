//! Domain models
//!
//! Database-facing structs derive `sqlx::FromRow` behind the `sqlx` feature;
//! API response shapes derive `utoipa::ToSchema`.

pub mod export;
pub mod lifecycle;
pub mod recording;
pub mod transcription;
pub mod usage;
pub mod user;

pub use export::{Export, ExportFormat, ExportResponse};
pub use lifecycle::{FileLifecycleInfo, FileLifecycleRecord, FileType, TranscriptionStatus};
pub use recording::{Recording, RecordingResponse, RecordingStatus};
pub use transcription::{Transcription, TranscriptionResponse};
pub use usage::{TierLimits, UsageAction, UsageTracking, UsageResponse};
pub use user::{SubscriptionStatus, SubscriptionTier, User};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Pagination query parameters shared by all list endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

impl PageQuery {
    /// Clamp to sane bounds and return (limit, offset) for SQL.
    pub fn limit_offset(&self) -> (i64, i64) {
        let page = self.page.max(1);
        let limit = self.limit.clamp(1, 100);
        (limit, (page - 1) * limit)
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationResponse {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PaginationResponse {
    pub fn new(query: &PageQuery, total: i64) -> Self {
        let (limit, _) = query.limit_offset();
        Self {
            page: query.page.max(1),
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_offset_clamps() {
        let q = PageQuery { page: 0, limit: 500 };
        assert_eq!(q.limit_offset(), (100, 0));
        let q = PageQuery { page: 3, limit: 10 };
        assert_eq!(q.limit_offset(), (10, 20));
    }

    #[test]
    fn test_pagination_response_total_pages() {
        let q = PageQuery { page: 1, limit: 10 };
        assert_eq!(PaginationResponse::new(&q, 0).total_pages, 0);
        assert_eq!(PaginationResponse::new(&q, 10).total_pages, 1);
        assert_eq!(PaginationResponse::new(&q, 11).total_pages, 2);
    }
}
