//! Wire protocol for greatwire file transfers.
//!
//! Control messages travel as single delimited text records on the same TCP
//! stream that later carries raw file bytes:
//!
//! ```text
//! RR***Great++<action>++<field2>[++<field3>]++***
//!   action = 1 (upload) | 2 (download)
//!   upload:   field2 = filename, field3 = size (decimal bytes)
//!   download: field2 = filename
//!   teardown: action = 1, field2 = "exit"
//! ```
//!
//! Responses are the bare tokens `ok` and `abort`. Everything in this crate is
//! pure: no sockets, no filesystem.

pub mod constants;
mod frame;
mod payload;
mod response;

pub use constants::{CHUNK_SIZE, DEFAULT_BACKLOG, DEFAULT_MAX_EMPTY_READS};
pub use frame::{ControlFrame, sanitize_filename};
pub use payload::{Payload, classify_payload};
pub use response::{Response, decode_size_line, encode_size};

/// Errors produced while decoding protocol messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(String),

    #[error("unknown action code: {0}")]
    UnknownAction(i64),

    #[error("invalid size message: {0}")]
    BadSize(String),
}
