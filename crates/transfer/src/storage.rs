use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use greatwire_protocol::Payload;
use tokio::sync::OwnedMutexGuard;

use crate::StorageError;

type LockMap = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// The server's flat file namespace.
///
/// Every filename resolves directly under `root`; there are no
/// subdirectories. The directory is created on first access. Readers and
/// writers of the same filename are serialized through a short-lived lock.
#[derive(Debug)]
pub struct Storage {
    root: PathBuf,
    locks: LockMap,
}

impl Storage {
    /// Creates a storage rooted at `root`. Nothing is touched on disk yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of `filename` inside the namespace.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    async fn ensure_root(&self) -> Result<(), StorageError> {
        if !tokio::fs::try_exists(&self.root).await? {
            tokio::fs::create_dir_all(&self.root).await?;
            tracing::info!(root = %self.root.display(), "storage directory created");
        }
        Ok(())
    }

    /// Takes the lock for `filename`, waiting for any current holder.
    pub async fn lock(&self, filename: &str) -> FileLock<'_> {
        let entry = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(filename.to_string()).or_default())
        };
        let guard = entry.lock_owned().await;
        FileLock {
            storage: self,
            filename: filename.to_string(),
            guard: Some(guard),
        }
    }

    /// Reads the whole content of `filename`.
    ///
    /// Returns [`StorageError::NotFound`] when the name is absent or is not a
    /// regular file.
    pub async fn read(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        self.ensure_root().await?;
        let path = self.path_for(filename);
        let _lock = self.lock(filename).await;

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(StorageError::NotFound(filename.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(filename.to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let data = tokio::fs::read(&path).await?;
        tracing::debug!(path = %path.display(), size = data.len(), "storage read");
        Ok(data)
    }

    /// Writes `payload` as the content of `filename`, replacing any previous file.
    pub async fn write(&self, filename: &str, payload: &Payload) -> Result<PathBuf, StorageError> {
        self.ensure_root().await?;
        let path = self.path_for(filename);
        let _lock = self.lock(filename).await;

        tokio::fs::write(&path, payload.as_bytes()).await?;
        tracing::debug!(
            path = %path.display(),
            size = payload.len(),
            kind = payload.kind(),
            "storage write"
        );
        Ok(path)
    }

    /// Number of filenames that currently have a lock entry.
    #[cfg(test)]
    fn active_locks(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive access to one filename in a [`Storage`].
///
/// Dropping the lock removes its map entry when nobody else is waiting.
pub struct FileLock<'a> {
    storage: &'a Storage,
    filename: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FileLock<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self
            .storage
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.filename)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&self.filename);
        }
    }
}
