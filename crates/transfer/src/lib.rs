//! Chunk accounting and on-disk storage for greatwire transfers.
//!
//! - [`ChunkTracker`] counts fixed-size chunks against a declared size.
//! - [`Storage`] is the server's flat file namespace.
//! - [`unique_local_path`] picks a collision-free name for client downloads.

mod local;
mod storage;
mod tracker;

pub use local::{COLLISION_PREFIX, unique_local_path, write_local};
pub use storage::{FileLock, Storage};
pub use tracker::{ChunkTracker, chunk_len, progress_percent, total_chunks};

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file not found: {0}")]
    NotFound(String),
}
