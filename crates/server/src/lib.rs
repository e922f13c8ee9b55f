//! TCP server side of the greatwire protocol.
//!
//! A [`Server`] accepts connections and runs one task per connection. Each
//! task owns a [`Session`], the explicit state machine that decides whether
//! the next bytes on the socket are a control frame or upload content, and
//! carries out its [`Effect`]s against the shared [`Storage`].
//!
//! [`Storage`]: greatwire_transfer::Storage

mod connection;
mod server;
pub mod session;

pub use connection::serve_connection;
pub use server::{Server, ServerConfig};
pub use session::{Effect, Session, SessionState, TransferState};

/// Errors produced by the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(#[from] greatwire_transfer::StorageError),

    #[error("cannot resolve listen address: {0}")]
    AddrResolve(String),
}
