//! The handler table a plugin installs into a [`crate::Client`].
//!
//! Grounded on `examples/original_source/guacd/src/client.c`'s dispatch of
//! `client->key`, `client->mouse`, `client->size`, `client->clipboard`, and
//! `client->handle_messages` function pointers: a plugin that does not wire
//! up a given event just leaves it at its default (a no-op here, a `NULL`
//! pointer there).

use async_trait::async_trait;

use guac_util::GuacStatus;

use crate::client::Client;
use crate::user::UserId;

/// Event callbacks a protocol plugin installs on a client.
///
/// Every method has a no-op default; a plugin overrides only the events it
/// cares about. [`Self::wants_handle_messages`] is the Rust equivalent of the
/// original's "is this function pointer `NULL`" check: the I/O engine's
/// output task only invokes [`Self::handle_messages`] when it returns `true`,
/// so a plugin with nothing to flush to the client between frames does not
/// pay for an empty call every tick.
#[async_trait]
pub trait ClientHandlers: Send + Sync {
    /// A user has joined the connection, with handshake arguments `argv`.
    async fn join(&self, _client: &Client, _user: &UserId, _argv: &[String]) -> Result<(), GuacStatus> {
        Ok(())
    }

    /// A user has left the connection.
    async fn leave(&self, _client: &Client, _user: &UserId) -> Result<(), GuacStatus> {
        Ok(())
    }

    /// A key was pressed (`pressed == true`) or released.
    async fn key(&self, _client: &Client, _user: &UserId, _keysym: i32, _pressed: bool) -> Result<(), GuacStatus> {
        Ok(())
    }

    /// The pointer moved to `(x, y)` with the given button mask.
    async fn mouse(&self, _client: &Client, _user: &UserId, _x: i32, _y: i32, _button_mask: u32) -> Result<(), GuacStatus> {
        Ok(())
    }

    /// The client's display was resized.
    async fn size(&self, _client: &Client, _user: &UserId, _width: u32, _height: u32) -> Result<(), GuacStatus> {
        Ok(())
    }

    /// Clipboard data was received from a user.
    async fn clipboard(&self, _client: &Client, _user: &UserId, _mimetype: &str, _data: &[u8]) -> Result<(), GuacStatus> {
        Ok(())
    }

    /// Whether [`Self::handle_messages`] should be polled by the output task.
    ///
    /// Default `false`, matching a plugin that never installs a
    /// `handle_messages` callback at all.
    fn wants_handle_messages(&self) -> bool {
        false
    }

    /// Drains and forwards any upstream messages waiting to be rendered.
    ///
    /// Only called when [`Self::wants_handle_messages`] returns `true`.
    async fn handle_messages(&self, _client: &Client) -> Result<(), GuacStatus> {
        Ok(())
    }

    /// The client is being torn down; release any plugin-owned resources.
    async fn free(&self, _client: &Client) -> Result<(), GuacStatus> {
        Ok(())
    }
}

/// A handler table that does nothing, used before a plugin has been
/// initialized and in tests that don't exercise plugin behavior.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandlers;

#[async_trait]
impl ClientHandlers for NoopHandlers {}
