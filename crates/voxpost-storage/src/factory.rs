use crate::{LocalStorage, Storage, StorageResult};
use std::sync::Arc;

/// Create the storage backend from configuration.
pub async fn create_storage(base_path: &str, base_url: &str) -> StorageResult<Arc<dyn Storage>> {
    let storage = LocalStorage::new(base_path, base_url.to_string()).await?;
    Ok(Arc::new(storage))
}
