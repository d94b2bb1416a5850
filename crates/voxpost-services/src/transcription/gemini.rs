//! Gemini speech-to-text provider.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::provider::{TranscriptRequest, TranscriptResult, TranscriptionProvider};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const MODEL: &str = "gemini-1.5-flash";

pub struct GeminiProvider {
    http_client: Client,
    api_key: String,
    api_base: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, api_base: Option<String>) -> Result<Self> {
        let http_client = Client::builder()
            // Long audio can take a while to transcribe.
            .timeout(Duration::from_secs(300))
            .build()
            .context("Failed to create HTTP client for Gemini")?;

        Ok(Self {
            http_client,
            api_key,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }

    fn mime_type(format: &str) -> &'static str {
        match format {
            "mp3" => "audio/mpeg",
            "wav" => "audio/wav",
            "m4a" => "audio/mp4",
            "ogg" => "audio/ogg",
            "webm" => "audio/webm",
            "flac" => "audio/flac",
            _ => "application/octet-stream",
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: String,
}

#[async_trait]
impl TranscriptionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn transcribe(&self, request: TranscriptRequest) -> Result<TranscriptResult> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base.trim_end_matches('/'),
            MODEL,
            self.api_key
        );

        let prompt = if request.language == "auto" {
            "Transcribe this audio recording verbatim. Return only the transcript text."
                .to_string()
        } else {
            format!(
                "Transcribe this audio recording verbatim in {}. Return only the transcript text.",
                request.language
            )
        };

        let body = json!({
            "contents": [{
                "parts": [
                    { "text": prompt },
                    {
                        "inline_data": {
                            "mime_type": Self::mime_type(&request.format),
                            "data": base64::engine::general_purpose::STANDARD.encode(&request.audio),
                        }
                    }
                ]
            }]
        });

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to call Gemini API")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow::anyhow!(
                "Gemini transcription failed: {} - {}",
                status,
                error_text
            ));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text.trim().to_string())
            .ok_or_else(|| anyhow::anyhow!("Gemini returned no transcript"))?;

        if text.is_empty() {
            return Err(anyhow::anyhow!("Gemini returned an empty transcript"));
        }

        Ok(TranscriptResult {
            text,
            // The generate API does not report per-transcript confidence.
            confidence_score: None,
            language: request.language,
        })
    }
}
