//! Error types for the client session.

use std::path::PathBuf;

/// Errors produced by a client operation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("local file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("server refused the upload of {0}")]
    Rejected(String),

    #[error("server did not confirm receipt of {0}")]
    TransferIncomplete(String),

    #[error("file not found on server: {0}")]
    NotFoundOnServer(String),

    #[error("unexpected response: {0:?}")]
    UnexpectedResponse(String),

    #[error("invalid size message: {0:?}")]
    BadSize(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] greatwire_protocol::FrameError),

    #[error("storage error: {0}")]
    Storage(#[from] greatwire_transfer::StorageError),
}
