//! Transcription provider abstraction.
//!
//! Cloud speech-to-text providers implement this trait; the orchestrator only
//! ever talks to the trait, so tests and local development run against the
//! mock without network access.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use voxpost_core::Config;

/// Audio handed to a provider for transcription.
#[derive(Debug, Clone)]
pub struct TranscriptRequest {
    pub audio: Vec<u8>,
    /// Container format, e.g. "mp3", "wav", "webm".
    pub format: String,
    /// Requested language, or "auto" for detection.
    pub language: String,
}

/// A finished transcript as returned by a provider.
#[derive(Debug, Clone)]
pub struct TranscriptResult {
    pub text: String,
    pub confidence_score: Option<f64>,
    /// Detected (or echoed) language.
    pub language: String,
}

#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Provider name stored on the transcription row (e.g. "mock", "gemini").
    fn name(&self) -> &str;

    async fn transcribe(&self, request: TranscriptRequest) -> Result<TranscriptResult>;
}

/// Deterministic provider for tests and local development. Produces a
/// transcript derived from the audio length so repeated runs agree.
pub struct MockProvider;

#[async_trait]
impl TranscriptionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcribe(&self, request: TranscriptRequest) -> Result<TranscriptResult> {
        if request.audio.is_empty() {
            return Err(anyhow::anyhow!("Empty audio payload"));
        }

        let text = format!(
            "This is a mock transcription of a {} byte {} recording. \
             It stands in for real speech to text output during development and testing.",
            request.audio.len(),
            request.format
        );

        Ok(TranscriptResult {
            text,
            confidence_score: Some(0.95),
            language: if request.language == "auto" {
                "en".to_string()
            } else {
                request.language
            },
        })
    }
}

/// Build the configured provider.
pub fn create_provider(config: &Config) -> Result<Arc<dyn TranscriptionProvider>> {
    match config.transcription_provider.as_str() {
        "mock" => Ok(Arc::new(MockProvider)),
        "gemini" => {
            let api_key = config
                .gemini_api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY not configured"))?;
            let provider = super::GeminiProvider::new(api_key, config.gemini_api_base_url.clone())?;
            Ok(Arc::new(provider))
        }
        other => Err(anyhow::anyhow!("Unknown transcription provider: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_is_deterministic() {
        let req = TranscriptRequest {
            audio: vec![0u8; 128],
            format: "mp3".to_string(),
            language: "auto".to_string(),
        };
        let a = MockProvider.transcribe(req.clone()).await.unwrap();
        let b = MockProvider.transcribe(req).await.unwrap();
        assert_eq!(a.text, b.text);
        assert_eq!(a.language, "en");
    }

    #[tokio::test]
    async fn test_mock_provider_rejects_empty_audio() {
        let req = TranscriptRequest {
            audio: vec![],
            format: "mp3".to_string(),
            language: "auto".to_string(),
        };
        assert!(MockProvider.transcribe(req).await.is_err());
    }
}
