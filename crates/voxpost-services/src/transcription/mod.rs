pub mod gemini;
pub mod orchestrator;
pub mod provider;

pub use gemini::GeminiProvider;
pub use orchestrator::TranscriptionOrchestrator;
pub use provider::{create_provider, MockProvider, TranscriptRequest, TranscriptResult, TranscriptionProvider};
