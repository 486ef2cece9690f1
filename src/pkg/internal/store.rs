use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};

use serde_json::Value;
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt, sync::RwLock};

use crate::pkg::internal::adaptors::jobs::spec::JobCollection;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    MalformedInput(String),
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Owner of the job collection and its backing file.
///
/// Writers hold the write side of `current` for the whole
/// memory-plus-disk update, so replacements never interleave.
/// `stale` is only touched under that lock and is set while the backing
/// file lags behind memory.
#[derive(Debug)]
pub struct JobStore {
    path: PathBuf,
    current: RwLock<JobCollection>,
    stale: AtomicBool,
    landings: AtomicU64,
}

impl JobStore {
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = match read_collection(&path).await {
            Ok(Some(collection)) if collection.is_empty() => collection,
            Ok(Some(collection)) => {
                tracing::info!(
                    "rehydrated {} jobs from {}",
                    collection.len(),
                    path.display()
                );
                collection
            }
            Ok(None) => JobCollection::default(),
            Err(err) => {
                tracing::warn!("ignoring unreadable {}: {}", path.display(), err);
                JobCollection::default()
            }
        };
        JobStore {
            path,
            current: RwLock::new(initial),
            stale: AtomicBool::new(false),
            landings: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fresh path next to the backing file for an upload to land on.
    pub fn landing_path(&self) -> PathBuf {
        let n = self.landings.fetch_add(1, Ordering::Relaxed);
        self.dir().join(format!(".upload-{}-{}.json", std::process::id(), n))
    }

    /// Persisted collection when readable, otherwise the in-memory one.
    pub async fn current(&self) -> JobCollection {
        let memory = self.current.read().await;
        if self.stale.load(Ordering::Acquire) {
            return memory.clone();
        }
        match read_collection(&self.path).await {
            Ok(Some(collection)) => collection,
            Ok(None) => memory.clone(),
            Err(err) => {
                tracing::warn!(
                    "falling back to memory, cannot read {}: {}",
                    self.path.display(),
                    err
                );
                memory.clone()
            }
        }
    }

    /// Swaps in `collection` and writes it out. Disk failures are logged only.
    pub async fn install(&self, collection: JobCollection) -> usize {
        let mut memory = self.current.write().await;
        let count = collection.len();
        match self.persist(&collection).await {
            Ok(()) => self.stale.store(false, Ordering::Release),
            Err(err) => {
                tracing::error!("failed to persist {}: {}", self.path.display(), err);
                self.stale.store(true, Ordering::Release);
            }
        }
        *memory = collection;
        count
    }

    /// Like [`JobStore::install`], but the already written `landed` file
    /// becomes the backing file instead of a fresh serialization.
    pub async fn install_file(&self, landed: &Path, collection: JobCollection) -> usize {
        let mut memory = self.current.write().await;
        let count = collection.len();
        match fs::rename(landed, &self.path).await {
            Ok(()) => self.stale.store(false, Ordering::Release),
            Err(err) => {
                tracing::error!(
                    "failed to move {} into {}: {}",
                    landed.display(),
                    self.path.display(),
                    err
                );
                discard(landed).await;
                self.stale.store(true, Ordering::Release);
            }
        }
        *memory = collection;
        count
    }

    async fn persist(&self, collection: &JobCollection) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(collection)
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?;
        write_atomic(&self.path, &bytes).await
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

/// `Ok(None)` when the file does not exist yet.
async fn read_collection(path: &Path) -> StoreResult<Option<JobCollection>> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| StoreError::MalformedInput(format!("corrupt backing file: {}", e)))?;
    Ok(Some(JobCollection::from_value(value)?))
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).await?;
    let tmp = tmp_path(path);
    let written = async {
        let mut f = fs::File::create(&tmp).await?;
        f.write_all(bytes).await?;
        f.sync_all().await?;
        fs::rename(&tmp, path).await
    }
    .await;
    if let Err(err) = written {
        discard(&tmp).await;
        return Err(err.into());
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    parent.join(format!(
        ".{}.tmp.{}",
        path.file_name().and_then(|s| s.to_str()).unwrap_or("jobs"),
        std::process::id()
    ))
}

pub async fn discard(path: &Path) {
    if let Err(err) = fs::remove_file(path).await {
        if err.kind() != ErrorKind::NotFound {
            tracing::warn!("failed to remove {}: {}", path.display(), err);
        }
    }
}
