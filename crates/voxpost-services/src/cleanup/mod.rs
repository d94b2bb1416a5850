pub mod service;

pub use service::{CleanupService, CleanupStore, PgCleanupStore, SweepReport};
