use std::sync::{
    Arc,
    atomic::{AtomicU32, Ordering},
};

use futures::{FutureExt, future::BoxFuture};

use crate::dao::{score_store::ScoreStore, storage::StorageResult};

/// Keeps the high score in memory only; used when saving is disabled.
#[derive(Clone, Default)]
pub struct MemoryScoreStore {
    // zero means "nothing saved yet"
    score: Arc<AtomicU32>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn load_high_score(&self) -> BoxFuture<'static, StorageResult<Option<u32>>> {
        let score = self.score.load(Ordering::Relaxed);
        async move { Ok((score > 0).then_some(score)) }.boxed()
    }

    fn save_high_score(&self, score: u32) -> BoxFuture<'static, StorageResult<()>> {
        self.score.store(score, Ordering::Relaxed);
        async { Ok(()) }.boxed()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        async { Ok(()) }.boxed()
    }
}
