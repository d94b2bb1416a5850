//! Voxpost core library
//!
//! Domain models, error taxonomy, configuration, and the pure file-retention
//! policy shared by all Voxpost crates.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
