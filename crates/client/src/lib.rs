//! Client side of the greatwire protocol.
//!
//! Every operation opens its own connection, sends one control frame,
//! reacts to the server's answer, streams file bytes if allowed, and always
//! ends with the teardown frame before closing the socket.
//!
//! # Wire format
//!
//! See [`wire`] module for the exchange on the stream.

pub mod client;
pub mod error;
pub mod wire;

pub use client::{Client, ClientConfig};
pub use error::ClientError;
