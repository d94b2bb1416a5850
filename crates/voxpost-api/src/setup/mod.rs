//! Application wiring: database, storage, services, routes, server.

pub mod database;
pub mod routes;
pub mod server;

use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use voxpost_core::Config;
use voxpost_db::{
    ExportRepository, FileLifecycleRepository, RecordingRepository, TranscriptionRepository,
    UsageRepository, UserRepository,
};
use voxpost_services::{
    create_provider, CleanupService, ExportService, PgCleanupStore, QuotaService,
    TranscriptionOrchestrator,
};
use voxpost_storage::create_storage;

use crate::auth::AuthState;
use crate::state::{AppState, DbState, ServiceState, UploadConfig};

/// Build every component and return the shared state plus the router.
/// Also starts the cleanup sweep loop.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    let pool = database::create_pool(&config).await?;
    database::run_migrations(&pool).await?;

    let storage = create_storage(&config.local_storage_path, &config.local_storage_base_url)
        .await
        .context("Failed to initialize storage backend")?;

    let users = UserRepository::new(pool.clone());
    let recordings = RecordingRepository::new(pool.clone());
    let lifecycle = FileLifecycleRepository::new(pool.clone());
    let transcriptions = TranscriptionRepository::new(pool.clone());
    let exports = ExportRepository::new(pool.clone());
    let usage = UsageRepository::new(pool.clone());

    let provider = create_provider(&config).context("Failed to create transcription provider")?;
    tracing::info!(provider = provider.name(), "Transcription provider ready");

    let orchestrator = TranscriptionOrchestrator::new(
        transcriptions.clone(),
        lifecycle.clone(),
        recordings.clone(),
        storage.clone(),
        provider,
        config.completed_grace_minutes,
    );

    let cleanup_store = PgCleanupStore::new(lifecycle.clone(), transcriptions.clone());
    let cleanup = Arc::new(CleanupService::new(
        Arc::new(cleanup_store),
        storage.clone(),
        Duration::from_secs(config.cleanup_interval_secs),
        Duration::from_secs(config.processing_timeout_secs),
    ));
    cleanup.clone().start().await;
    tracing::info!(
        interval_secs = config.cleanup_interval_secs,
        "Cleanup sweep loop started"
    );

    let export_service = ExportService::new(exports.clone(), transcriptions.clone());
    let quota = QuotaService::new(usage.clone());

    let auth_state = Arc::new(AuthState {
        jwt_secret: config.jwt_secret.clone(),
        users: users.clone(),
    });

    let state = Arc::new(AppState {
        db: DbState {
            users,
            recordings,
            lifecycle,
            transcriptions,
            exports,
            usage,
        },
        services: ServiceState {
            orchestrator,
            cleanup,
            exports: export_service,
            quota,
        },
        upload: UploadConfig {
            storage,
            max_upload_size_bytes: config.max_upload_size_bytes,
            audio_allowed_extensions: config.audio_allowed_extensions.clone(),
            video_allowed_extensions: config.video_allowed_extensions.clone(),
        },
        config,
    });

    let router = routes::build_router(state.clone(), auth_state);

    Ok((state, router))
}
