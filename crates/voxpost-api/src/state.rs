//! Application state and sub-state extractors.
//!
//! AppState is split into domain sub-states so handlers can extract only what
//! they need via Axum's `FromRef`.

use std::sync::Arc;
use voxpost_core::Config;
use voxpost_db::{
    ExportRepository, FileLifecycleRepository, RecordingRepository, TranscriptionRepository,
    UsageRepository, UserRepository,
};
use voxpost_services::{CleanupService, ExportService, QuotaService, TranscriptionOrchestrator};
use voxpost_storage::Storage;

/// Repositories shared by handlers.
#[derive(Clone)]
pub struct DbState {
    pub users: UserRepository,
    pub recordings: RecordingRepository,
    pub lifecycle: FileLifecycleRepository,
    pub transcriptions: TranscriptionRepository,
    pub exports: ExportRepository,
    pub usage: UsageRepository,
}

/// Business services.
#[derive(Clone)]
pub struct ServiceState {
    pub orchestrator: TranscriptionOrchestrator,
    pub cleanup: Arc<CleanupService>,
    pub exports: ExportService,
    pub quota: QuotaService,
}

/// Upload limits and the storage backend.
#[derive(Clone)]
pub struct UploadConfig {
    pub storage: Arc<dyn Storage>,
    pub max_upload_size_bytes: usize,
    pub audio_allowed_extensions: Vec<String>,
    pub video_allowed_extensions: Vec<String>,
}

pub struct AppState {
    pub db: DbState,
    pub services: ServiceState,
    pub upload: UploadConfig,
    pub config: Config,
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for ServiceState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.services.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for UploadConfig {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.upload.clone()
    }
}
