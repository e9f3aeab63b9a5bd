use std::{io::ErrorKind, path::PathBuf, sync::Arc};

use futures::{FutureExt, future::BoxFuture};
use tokio::fs;
use tracing::{debug, warn};

use crate::dao::{
    score_store::ScoreStore,
    storage::{StorageError, StorageResult},
};

/// Stores the high score as a single decimal number on the first line of a text file.
#[derive(Clone)]
pub struct FileScoreStore {
    path: Arc<PathBuf>,
}

impl FileScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    /// Location of the save file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ScoreStore for FileScoreStore {
    fn load_high_score(&self) -> BoxFuture<'static, StorageResult<Option<u32>>> {
        let path = self.path.clone();
        async move {
            let contents = match fs::read_to_string(path.as_path()).await {
                Ok(contents) => contents,
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "no saved high score");
                    return Ok(None);
                }
                Err(err) => return Err(StorageError::io(path.as_path(), err)),
            };

            let first_line = contents.lines().next().unwrap_or_default().trim();
            match first_line.parse::<u32>() {
                Ok(score) => Ok(Some(score)),
                Err(err) => {
                    // unreadable saves are discarded so the next save starts clean
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "discarding corrupt high score file"
                    );
                    if let Err(remove_err) = fs::remove_file(path.as_path()).await {
                        warn!(
                            path = %path.display(),
                            error = %remove_err,
                            "failed to remove corrupt high score file"
                        );
                    }
                    Ok(None)
                }
            }
        }
        .boxed()
    }

    fn save_high_score(&self, score: u32) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.path.clone();
        async move {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StorageError::io(parent, source))?;
            }
            fs::write(path.as_path(), score.to_string())
                .await
                .map_err(|source| StorageError::io(path.as_path(), source))
        }
        .boxed()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.path.clone();
        async move {
            let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
                return Ok(());
            };
            match fs::metadata(parent).await {
                Ok(meta) if meta.permissions().readonly() => Err(StorageError::io(
                    parent,
                    std::io::Error::new(ErrorKind::PermissionDenied, "save directory is read-only"),
                )),
                Ok(_) => Ok(()),
                // the directory is created on first save
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
                Err(err) => Err(StorageError::io(parent, err)),
            }
        }
        .boxed()
    }
}
