#[cfg(feature = "file-store")]
pub mod file;
pub mod memory;

use std::{path::Path, sync::Arc};

use futures::future::BoxFuture;
use tracing::info;

use crate::dao::storage::StorageResult;

/// Abstraction over where the high score is kept between runs.
pub trait ScoreStore: Send + Sync {
    /// Previously saved high score, if any.
    fn load_high_score(&self) -> BoxFuture<'static, StorageResult<Option<u32>>>;
    /// Persist a new high score, replacing the previous one.
    fn save_high_score(&self, score: u32) -> BoxFuture<'static, StorageResult<()>>;
    /// Check that the backing storage is usable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Pick the store for a configured save path, returning it with whether it persists.
pub fn from_save_path(save_path: Option<&Path>) -> (Arc<dyn ScoreStore>, bool) {
    if let Some(store) = save_path.and_then(file_store) {
        return (store, true);
    }
    info!("high scores are kept in memory only");
    (Arc::new(memory::MemoryScoreStore::new()), false)
}

#[cfg(feature = "file-store")]
fn file_store(path: &Path) -> Option<Arc<dyn ScoreStore>> {
    let store = file::FileScoreStore::new(path);
    info!(path = %store.path().display(), "saving high scores to file");
    Some(Arc::new(store))
}

#[cfg(not(feature = "file-store"))]
fn file_store(path: &Path) -> Option<Arc<dyn ScoreStore>> {
    tracing::warn!(
        path = %path.display(),
        "built without the `file-store` feature; ignoring save path"
    );
    None
}
