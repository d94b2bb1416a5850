//! Storage abstraction for uploaded recordings.
//!
//! # Storage key format
//!
//! Keys are user-scoped: `users/{user_id}/recordings/{recording_id}.{ext}`.
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so every caller produces the same layout.

pub mod factory;
pub(crate) mod keys;
pub mod local;
pub mod traits;

pub use factory::create_storage;
pub use keys::recording_key;
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
