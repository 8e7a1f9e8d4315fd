//! Per-connection client state.
//!
//! A [`Client`] is the thing a plugin, the I/O engine, and the listener all
//! share a reference to for the lifetime of one proxied connection: the
//! rendering socket, the layer/buffer/stream id pools, a lifecycle flag the
//! I/O engine and any handler can observe, the user list, and a type-erased
//! slot a plugin may stash its own state in.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod client;
mod handlers;
mod user;

pub use client::{Client, ClientState, current_timestamp_millis};
pub use handlers::{ClientHandlers, NoopHandlers};
pub use user::UserId;
