//! Database repositories for data access layer
//!
//! Each repository owns one domain entity and provides CRUD operations and
//! specialized queries. Multi-row state transitions (transcription status
//! fan-out, retry) run inside a single transaction so the transcription and
//! lifecycle rows can never disagree.

pub mod exports;
pub mod lifecycle;
pub mod recordings;
pub mod transaction;
pub mod transcriptions;
pub mod usage;
pub mod users;

pub use exports::ExportRepository;
pub use lifecycle::FileLifecycleRepository;
pub use recordings::RecordingRepository;
pub use transaction::TransactionGuard;
pub use transcriptions::TranscriptionRepository;
pub use usage::UsageRepository;
pub use users::UserRepository;
