//! Business services: transcription orchestration, retention cleanup,
//! content export, and quota enforcement.

pub mod cleanup;
pub mod export;
pub mod quota;
pub mod transcription;

pub use cleanup::{CleanupService, CleanupStore, PgCleanupStore, SweepReport};
pub use export::{ExportOptions, ExportService, GeneratedContent};
pub use quota::QuotaService;
pub use transcription::{
    create_provider, GeminiProvider, MockProvider, TranscriptRequest, TranscriptResult,
    TranscriptionOrchestrator, TranscriptionProvider,
};
