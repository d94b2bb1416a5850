//! Transcription orchestration.
//!
//! Drives a recording through provider transcription: claims the work in the
//! database, runs the provider in a background task, and lands the outcome
//! through the transactional status fan-out so the transcription row, the
//! lifecycle row, and the recording status always agree.

use std::sync::Arc;
use uuid::Uuid;
use voxpost_core::models::{
    FileLifecycleRecord, Recording, RecordingStatus, Transcription, TranscriptionStatus,
};
use voxpost_core::AppError;
use voxpost_db::{FileLifecycleRepository, RecordingRepository, TranscriptionRepository};
use voxpost_storage::Storage;

use super::provider::{TranscriptRequest, TranscriptionProvider};

#[derive(Clone)]
pub struct TranscriptionOrchestrator {
    transcriptions: TranscriptionRepository,
    lifecycle: FileLifecycleRepository,
    recordings: RecordingRepository,
    storage: Arc<dyn Storage>,
    provider: Arc<dyn TranscriptionProvider>,
    grace_minutes: i64,
}

impl TranscriptionOrchestrator {
    pub fn new(
        transcriptions: TranscriptionRepository,
        lifecycle: FileLifecycleRepository,
        recordings: RecordingRepository,
        storage: Arc<dyn Storage>,
        provider: Arc<dyn TranscriptionProvider>,
        grace_minutes: i64,
    ) -> Self {
        Self {
            transcriptions,
            lifecycle,
            recordings,
            storage,
            provider,
            grace_minutes,
        }
    }

    /// Load the recording and its lifecycle row and verify transcription can
    /// begin. Shared by [`start`](Self::start) and the quota gate in the API
    /// layer, which must not charge a request that would be rejected here.
    async fn load_startable(
        &self,
        recording_id: Uuid,
        user_id: Uuid,
    ) -> Result<(Recording, FileLifecycleRecord), AppError> {
        let recording = self
            .recordings
            .get(recording_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Recording not found".to_string()))?;

        let lifecycle = self
            .lifecycle
            .get_by_recording(recording_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Recording has no file".to_string()))?;

        if !lifecycle.file_present() {
            return Err(AppError::InvalidState(
                "The audio file has already been deleted".to_string(),
            ));
        }

        match lifecycle.transcription_status {
            TranscriptionStatus::Pending => {}
            TranscriptionStatus::Processing => {
                return Err(AppError::InvalidState(
                    "Transcription is already in progress".to_string(),
                ));
            }
            TranscriptionStatus::Completed => {
                return Err(AppError::InvalidState(
                    "Recording is already transcribed".to_string(),
                ));
            }
            TranscriptionStatus::Failed => {
                return Err(AppError::InvalidState(
                    "Transcription failed; use the retry endpoint".to_string(),
                ));
            }
        }

        Ok((recording, lifecycle))
    }

    /// Precondition check without claiming any work.
    pub async fn check_startable(&self, recording_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
        self.load_startable(recording_id, user_id).await.map(|_| ())
    }

    /// Begin transcribing a recording. Returns the `processing` transcription
    /// immediately; the provider call runs in a spawned task and reports back
    /// through the database.
    #[tracing::instrument(skip(self), fields(recording_id = %recording_id))]
    pub async fn start(
        &self,
        recording_id: Uuid,
        user_id: Uuid,
        language: &str,
    ) -> Result<Transcription, AppError> {
        let (recording, lifecycle) = self.load_startable(recording_id, user_id).await?;

        let transcription = self
            .transcriptions
            .create_processing(recording_id, user_id, self.provider.name(), language)
            .await?;

        self.recordings
            .update_status(recording_id, RecordingStatus::Processing)
            .await?;

        let file_path = lifecycle
            .file_path
            .clone()
            .ok_or_else(|| AppError::Internal("Lifecycle row lost its file path".to_string()))?;

        self.spawn_run(transcription.clone(), file_path, recording.format);

        Ok(transcription)
    }

    /// Retry a failed transcription. The database claim decides the winner;
    /// if it misses, the caller learns whether the budget is spent or the
    /// state simply changed.
    #[tracing::instrument(skip(self), fields(transcription_id = %transcription_id))]
    pub async fn retry(
        &self,
        transcription_id: Uuid,
        user_id: Uuid,
    ) -> Result<Transcription, AppError> {
        let claimed = self
            .transcriptions
            .retry_with_lifecycle(transcription_id, user_id)
            .await?;

        let transcription = match claimed {
            Some(t) => t,
            None => {
                // Distinguish "no budget" from "wrong state" for the client.
                let existing = self
                    .transcriptions
                    .get(transcription_id, user_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Transcription not found".to_string()))?;

                let lifecycle = self
                    .lifecycle
                    .get_by_recording(existing.recording_id)
                    .await?;

                if let Some(lc) = &lifecycle {
                    if lc.transcription_status == TranscriptionStatus::Failed
                        && lc.retry_count >= lc.max_retries
                    {
                        return Err(AppError::RetryExhausted(format!(
                            "All {} transcription attempts have been used",
                            lc.max_retries
                        )));
                    }
                    if !lc.file_present() {
                        return Err(AppError::InvalidState(
                            "The audio file has already been deleted".to_string(),
                        ));
                    }
                }

                return Err(AppError::InvalidState(
                    "Transcription is not in a retryable state".to_string(),
                ));
            }
        };

        let lifecycle = self
            .lifecycle
            .get_by_recording(transcription.recording_id)
            .await?
            .ok_or_else(|| AppError::Internal("Lifecycle row missing".to_string()))?;

        let file_path = lifecycle
            .file_path
            .ok_or_else(|| AppError::Internal("Lifecycle row lost its file path".to_string()))?;

        let recording = self
            .recordings
            .get_any(transcription.recording_id)
            .await?
            .ok_or_else(|| AppError::Internal("Recording row missing".to_string()))?;

        self.recordings
            .update_status(transcription.recording_id, RecordingStatus::Processing)
            .await?;

        self.spawn_run(transcription.clone(), file_path, recording.format);

        Ok(transcription)
    }

    fn spawn_run(&self, transcription: Transcription, file_path: String, format: String) {
        let this = self.clone();
        tokio::spawn(async move {
            this.run(transcription, file_path, format).await;
        });
    }

    /// Execute the provider call and land the outcome. Every failure path
    /// goes through `fail_with_lifecycle` so the retry budget stays honest.
    async fn run(&self, transcription: Transcription, file_path: String, format: String) {
        let outcome = self.transcribe_file(&file_path, &format, &transcription).await;

        match outcome {
            Ok(result) => {
                let word_count = result.text.split_whitespace().count() as i32;
                match self
                    .transcriptions
                    .complete_with_lifecycle(
                        transcription.id,
                        &result.text,
                        result.confidence_score,
                        &result.language,
                        word_count,
                        self.grace_minutes,
                    )
                    .await
                {
                    Ok(Some(_)) => {
                        if let Err(e) = self
                            .recordings
                            .update_status(transcription.recording_id, RecordingStatus::Ready)
                            .await
                        {
                            tracing::error!(
                                recording_id = %transcription.recording_id,
                                error = %e,
                                "Failed to mark recording ready"
                            );
                        }
                        tracing::info!(
                            transcription_id = %transcription.id,
                            word_count,
                            "Transcription completed"
                        );
                    }
                    Ok(None) => {
                        tracing::warn!(
                            transcription_id = %transcription.id,
                            "Transcription was no longer processing when the result arrived"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            transcription_id = %transcription.id,
                            error = %e,
                            "Failed to store transcription result"
                        );
                    }
                }
            }
            Err(message) => {
                match self
                    .transcriptions
                    .fail_with_lifecycle(transcription.id, &message)
                    .await
                {
                    Ok(Some(_)) => {
                        if let Err(e) = self
                            .recordings
                            .update_status(transcription.recording_id, RecordingStatus::Failed)
                            .await
                        {
                            tracing::error!(
                                recording_id = %transcription.recording_id,
                                error = %e,
                                "Failed to mark recording failed"
                            );
                        }
                        tracing::warn!(
                            transcription_id = %transcription.id,
                            error = %message,
                            "Transcription failed"
                        );
                    }
                    Ok(None) => {
                        tracing::warn!(
                            transcription_id = %transcription.id,
                            "Transcription was no longer processing when the failure arrived"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            transcription_id = %transcription.id,
                            error = %e,
                            "Failed to record transcription failure"
                        );
                    }
                }
            }
        }
    }

    async fn transcribe_file(
        &self,
        file_path: &str,
        format: &str,
        transcription: &Transcription,
    ) -> Result<super::provider::TranscriptResult, String> {
        let audio = self
            .storage
            .download(file_path)
            .await
            .map_err(|e| format!("Failed to read audio file: {e}"))?;

        self.provider
            .transcribe(TranscriptRequest {
                audio,
                format: format.to_string(),
                language: transcription.language.clone(),
            })
            .await
            .map_err(|e| format!("Provider error: {e}"))
    }
}
