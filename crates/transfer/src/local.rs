use std::path::{Path, PathBuf};

use greatwire_protocol::Payload;

use crate::StorageError;

/// Prepended to a downloaded filename until it no longer collides.
pub const COLLISION_PREFIX: &str = "(1) ";

/// Picks the path a download of `filename` should be saved to in `dir`.
///
/// While a file of that name exists, [`COLLISION_PREFIX`] is prepended again:
/// `out.txt`, then `(1) out.txt`, then `(1) (1) out.txt`.
pub async fn unique_local_path(dir: &Path, filename: &str) -> Result<PathBuf, StorageError> {
    let mut name = filename.to_string();
    while tokio::fs::try_exists(dir.join(&name)).await? {
        name = format!("{COLLISION_PREFIX}{name}");
    }
    Ok(dir.join(name))
}

/// Saves a downloaded payload at `path`, creating the parent directory if needed.
pub async fn write_local(path: &Path, payload: &Payload) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, payload.as_bytes()).await?;
    tracing::debug!(path = %path.display(), kind = payload.kind(), "local file written");
    Ok(())
}
