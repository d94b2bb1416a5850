//! Export service: turns completed transcripts into platform-ready content.

pub mod generators;

pub use generators::{generate, ExportOptions, GeneratedContent};

use uuid::Uuid;
use voxpost_core::models::{Export, ExportFormat, TranscriptionStatus};
use voxpost_core::AppError;
use voxpost_db::{ExportRepository, TranscriptionRepository};

#[derive(Clone)]
pub struct ExportService {
    exports: ExportRepository,
    transcriptions: TranscriptionRepository,
}

impl ExportService {
    pub fn new(exports: ExportRepository, transcriptions: TranscriptionRepository) -> Self {
        Self {
            exports,
            transcriptions,
        }
    }

    /// Generate and persist an export. Regenerating the same format for the
    /// same transcription replaces the stored content.
    #[tracing::instrument(skip(self, options), fields(transcription_id = %transcription_id, format = format.as_str()))]
    pub async fn create(
        &self,
        user_id: Uuid,
        transcription_id: Uuid,
        format: ExportFormat,
        options: &ExportOptions,
    ) -> Result<Export, AppError> {
        let transcription = self
            .transcriptions
            .get(transcription_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Transcription not found".to_string()))?;

        if transcription.status != TranscriptionStatus::Completed {
            return Err(AppError::InvalidState(
                "Transcription is not completed".to_string(),
            ));
        }

        let text = transcription
            .text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AppError::InvalidState("Transcription text is empty".to_string()))?;

        let generated = generators::generate(format, text, options);

        let export = self
            .exports
            .upsert(
                transcription_id,
                user_id,
                format,
                &generated.content,
                Some(generated.metadata),
            )
            .await?;

        Ok(export)
    }
}
