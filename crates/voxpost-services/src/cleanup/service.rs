//! Retention cleanup service.
//!
//! Owns a background task that periodically deletes files whose retention
//! window has expired, and fails transcriptions stuck in `processing` past
//! the watchdog timeout. A sweep can also be triggered manually through the
//! admin endpoint; an atomic guard keeps the scheduled and manual runs from
//! overlapping.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::interval;
use uuid::Uuid;
use voxpost_core::models::FileLifecycleRecord;
use voxpost_core::AppError;
use voxpost_db::{FileLifecycleRepository, TranscriptionRepository};
use voxpost_storage::Storage;

/// Batch size per sweep; keeps one sweep from holding the storage backend
/// for an unbounded stretch when a backlog builds up.
const SWEEP_BATCH_SIZE: i64 = 100;

/// Persistence seam for the sweeper.
#[async_trait]
pub trait CleanupStore: Send + Sync {
    async fn list_deletion_eligible(
        &self,
        now: chrono::DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<FileLifecycleRecord>, AppError>;

    async fn mark_deleted(&self, id: Uuid) -> Result<Option<FileLifecycleRecord>, AppError>;

    /// Fail transcriptions stuck in `processing` since before the given
    /// instant. Returns how many were reaped.
    async fn reap_stale_processing(
        &self,
        stale_before: chrono::DateTime<Utc>,
    ) -> Result<usize, AppError>;
}

/// Production store backed by the Postgres repositories.
#[derive(Clone)]
pub struct PgCleanupStore {
    lifecycle: FileLifecycleRepository,
    transcriptions: TranscriptionRepository,
}

impl PgCleanupStore {
    pub fn new(lifecycle: FileLifecycleRepository, transcriptions: TranscriptionRepository) -> Self {
        Self {
            lifecycle,
            transcriptions,
        }
    }
}

#[async_trait]
impl CleanupStore for PgCleanupStore {
    async fn list_deletion_eligible(
        &self,
        now: chrono::DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<FileLifecycleRecord>, AppError> {
        self.lifecycle.list_deletion_eligible(now, limit).await
    }

    async fn mark_deleted(&self, id: Uuid) -> Result<Option<FileLifecycleRecord>, AppError> {
        self.lifecycle.mark_deleted(id).await
    }

    async fn reap_stale_processing(
        &self,
        stale_before: chrono::DateTime<Utc>,
    ) -> Result<usize, AppError> {
        let reaped = self.transcriptions.reap_stale_processing(stale_before).await?;
        Ok(reaped.len())
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SweepReport {
    pub files_deleted: usize,
    pub files_failed: usize,
    pub stale_transcriptions_reaped: usize,
}

pub struct CleanupService {
    store: Arc<dyn CleanupStore>,
    storage: Arc<dyn Storage>,
    sweep_interval: Duration,
    /// Watchdog threshold for stuck `processing` transcriptions; zero
    /// disables the watchdog entirely.
    processing_timeout: Duration,
    sweeping: AtomicBool,
    shutdown_tx: Mutex<Option<mpsc::Sender<()>>>,
}

impl CleanupService {
    pub fn new(
        store: Arc<dyn CleanupStore>,
        storage: Arc<dyn Storage>,
        sweep_interval: Duration,
        processing_timeout: Duration,
    ) -> Self {
        Self {
            store,
            storage,
            sweep_interval,
            processing_timeout,
            sweeping: AtomicBool::new(false),
            shutdown_tx: Mutex::new(None),
        }
    }

    /// Start the background sweep loop. Returns a JoinHandle for graceful
    /// shutdown; call [`stop`](Self::stop) to end the loop.
    pub async fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let (tx, mut rx) = mpsc::channel::<()>(1);
        *self.shutdown_tx.lock().await = Some(tx);

        tokio::spawn(async move {
            let mut sweep_interval = interval(self.sweep_interval);
            // The first tick fires immediately; skip it so startup isn't a sweep.
            sweep_interval.tick().await;

            loop {
                tokio::select! {
                    _ = sweep_interval.tick() => {
                        match self.run_sweep().await {
                            Ok(Some(report)) => {
                                tracing::info!(
                                    files_deleted = report.files_deleted,
                                    files_failed = report.files_failed,
                                    stale_reaped = report.stale_transcriptions_reaped,
                                    "Scheduled cleanup sweep completed"
                                );
                            }
                            Ok(None) => {
                                tracing::warn!("Skipping scheduled sweep; previous sweep still running");
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "Cleanup sweep failed");
                            }
                        }
                    }
                    _ = rx.recv() => {
                        tracing::info!("Cleanup service shutting down");
                        break;
                    }
                }
            }
        })
    }

    /// Signal the background loop to stop.
    pub async fn stop(&self) {
        if let Some(tx) = self.shutdown_tx.lock().await.take() {
            let _ = tx.send(()).await;
        }
    }

    /// Run one sweep. Returns `Ok(None)` when another sweep is already in
    /// flight (scheduled and manual triggers share the guard).
    pub async fn run_sweep(&self) -> Result<Option<SweepReport>, AppError> {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(None);
        }

        let result = self.sweep_inner().await;
        self.sweeping.store(false, Ordering::Release);
        result.map(Some)
    }

    #[tracing::instrument(skip(self))]
    async fn sweep_inner(&self) -> Result<SweepReport, AppError> {
        let mut report = SweepReport::default();
        let now = Utc::now();

        // Watchdog first: a reaped transcription may collapse its file's
        // schedule and become deletion-eligible within this same sweep.
        // A zero timeout disables the watchdog.
        if !self.processing_timeout.is_zero() {
            let timeout = ChronoDuration::from_std(self.processing_timeout)
                .unwrap_or_else(|_| ChronoDuration::seconds(600));
            match self.store.reap_stale_processing(now - timeout).await {
                Ok(count) => report.stale_transcriptions_reaped = count,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to reap stale transcriptions");
                }
            }
        }

        let eligible = self
            .store
            .list_deletion_eligible(Utc::now(), SWEEP_BATCH_SIZE)
            .await?;

        for record in eligible {
            let Some(file_path) = record.file_path.as_deref() else {
                continue;
            };

            tracing::info!(
                lifecycle_id = %record.id,
                recording_id = %record.recording_id,
                file_path,
                deletion_scheduled_at = %record.deletion_scheduled_at,
                "Deleting expired file"
            );

            // One bad file must not stall the rest of the batch. Storage
            // delete is idempotent, so the row is only marked after the
            // file is really gone; a failure leaves it for the next sweep.
            match self.storage.delete(file_path).await {
                Ok(()) => match self.store.mark_deleted(record.id).await {
                    Ok(_) => report.files_deleted += 1,
                    Err(e) => {
                        report.files_failed += 1;
                        tracing::error!(
                            lifecycle_id = %record.id,
                            error = %e,
                            "File deleted from storage but could not be marked deleted"
                        );
                    }
                },
                Err(e) => {
                    report.files_failed += 1;
                    tracing::error!(
                        lifecycle_id = %record.id,
                        file_path,
                        error = %e,
                        "Failed to delete file from storage, will retry next sweep"
                    );
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration as ChronoDuration};
    use std::collections::HashSet;
    use std::sync::Mutex as StdMutex;
    use voxpost_core::models::{FileType, TranscriptionStatus};
    use voxpost_storage::{StorageError, StorageResult};

    struct MemoryStore {
        records: StdMutex<Vec<FileLifecycleRecord>>,
        reaped: StdMutex<usize>,
    }

    impl MemoryStore {
        fn new(records: Vec<FileLifecycleRecord>) -> Self {
            Self {
                records: StdMutex::new(records),
                reaped: StdMutex::new(0),
            }
        }
    }

    #[async_trait]
    impl CleanupStore for MemoryStore {
        async fn list_deletion_eligible(
            &self,
            now: DateTime<Utc>,
            limit: i64,
        ) -> Result<Vec<FileLifecycleRecord>, AppError> {
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .filter(|r| {
                    r.file_path.is_some() && r.deleted_at.is_none() && r.deletion_scheduled_at <= now
                })
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn mark_deleted(&self, id: Uuid) -> Result<Option<FileLifecycleRecord>, AppError> {
            let mut records = self.records.lock().unwrap();
            for r in records.iter_mut() {
                if r.id == id {
                    r.file_path = None;
                    r.deleted_at = Some(Utc::now());
                    return Ok(Some(r.clone()));
                }
            }
            Ok(None)
        }

        async fn reap_stale_processing(
            &self,
            _stale_before: DateTime<Utc>,
        ) -> Result<usize, AppError> {
            *self.reaped.lock().unwrap() += 1;
            Ok(0)
        }
    }

    /// Storage that fails deletes for a chosen set of keys.
    struct FlakyStorage {
        fail_keys: HashSet<String>,
        deleted: StdMutex<Vec<String>>,
    }

    impl FlakyStorage {
        fn new(fail_keys: impl IntoIterator<Item = &'static str>) -> Self {
            Self {
                fail_keys: fail_keys.into_iter().map(String::from).collect(),
                deleted: StdMutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Storage for FlakyStorage {
        async fn upload(&self, _key: &str, _data: Vec<u8>) -> StorageResult<String> {
            unimplemented!("not used by the sweeper")
        }

        async fn download(&self, _key: &str) -> StorageResult<Vec<u8>> {
            unimplemented!("not used by the sweeper")
        }

        async fn delete(&self, key: &str) -> StorageResult<()> {
            if self.fail_keys.contains(key) {
                return Err(StorageError::DeleteFailed(format!("simulated: {key}")));
            }
            self.deleted.lock().unwrap().push(key.to_string());
            Ok(())
        }

        async fn exists(&self, key: &str) -> StorageResult<bool> {
            Ok(!self.deleted.lock().unwrap().contains(&key.to_string()))
        }

        async fn content_length(&self, _key: &str) -> StorageResult<u64> {
            Ok(0)
        }
    }

    fn expired_record(path: &str) -> FileLifecycleRecord {
        let now = Utc::now();
        FileLifecycleRecord {
            id: Uuid::new_v4(),
            recording_id: Uuid::new_v4(),
            file_path: Some(path.to_string()),
            file_type: FileType::Audio,
            file_size: 100,
            uploaded_at: now - ChronoDuration::days(8),
            transcription_status: TranscriptionStatus::Completed,
            transcription_id: Some(Uuid::new_v4()),
            deletion_scheduled_at: now - ChronoDuration::hours(1),
            retry_count: 0,
            max_retries: 3,
            deleted_at: None,
            updated_at: now,
        }
    }

    fn service(store: Arc<dyn CleanupStore>, storage: Arc<dyn Storage>) -> CleanupService {
        CleanupService::new(
            store,
            storage,
            Duration::from_secs(3600),
            Duration::from_secs(600),
        )
    }

    #[tokio::test]
    async fn test_sweep_deletes_expired_files() {
        let store = Arc::new(MemoryStore::new(vec![
            expired_record("a.mp3"),
            expired_record("b.mp3"),
        ]));
        let storage = Arc::new(FlakyStorage::new([]));
        let svc = service(store.clone(), storage.clone());

        let report = svc.run_sweep().await.unwrap().unwrap();
        assert_eq!(report.files_deleted, 2);
        assert_eq!(report.files_failed, 0);

        // Rows are marked deleted; a second sweep finds nothing.
        let report = svc.run_sweep().await.unwrap().unwrap();
        assert_eq!(report.files_deleted, 0);
    }

    #[tokio::test]
    async fn test_sweep_isolates_per_file_failures() {
        let store = Arc::new(MemoryStore::new(vec![
            expired_record("ok1.mp3"),
            expired_record("bad.mp3"),
            expired_record("ok2.mp3"),
        ]));
        let storage = Arc::new(FlakyStorage::new(["bad.mp3"]));
        let svc = service(store.clone(), storage.clone());

        let report = svc.run_sweep().await.unwrap().unwrap();
        assert_eq!(report.files_deleted, 2);
        assert_eq!(report.files_failed, 1);

        // The failed file keeps its row and stays eligible for the next sweep.
        let remaining = store
            .list_deletion_eligible(Utc::now(), 100)
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].file_path.as_deref(), Some("bad.mp3"));
    }

    #[tokio::test]
    async fn test_sweep_guard_rejects_overlap() {
        let store = Arc::new(MemoryStore::new(vec![]));
        let storage = Arc::new(FlakyStorage::new([]));
        let svc = service(store, storage);

        svc.sweeping.store(true, Ordering::Release);
        assert!(svc.run_sweep().await.unwrap().is_none());

        svc.sweeping.store(false, Ordering::Release);
        assert!(svc.run_sweep().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sweep_runs_watchdog() {
        let store = Arc::new(MemoryStore::new(vec![]));
        let storage = Arc::new(FlakyStorage::new([]));
        let svc = service(store.clone(), storage);

        svc.run_sweep().await.unwrap().unwrap();
        assert_eq!(*store.reaped.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_zero_timeout_disables_watchdog() {
        let store = Arc::new(MemoryStore::new(vec![expired_record("a.mp3")]));
        let storage = Arc::new(FlakyStorage::new([]));
        let svc = CleanupService::new(
            store.clone(),
            storage,
            Duration::from_secs(3600),
            Duration::ZERO,
        );

        // File deletion still runs; only the reap is skipped.
        let report = svc.run_sweep().await.unwrap().unwrap();
        assert_eq!(*store.reaped.lock().unwrap(), 0);
        assert_eq!(report.stale_transcriptions_reaped, 0);
        assert_eq!(report.files_deleted, 1);
    }

    #[tokio::test]
    async fn test_start_stop() {
        let store = Arc::new(MemoryStore::new(vec![]));
        let storage = Arc::new(FlakyStorage::new([]));
        let svc = Arc::new(service(store, storage));

        let handle = svc.clone().start().await;
        svc.stop().await;
        handle.await.unwrap();
    }
}
