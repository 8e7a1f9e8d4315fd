//! The per-connection [`Client`] object.

use std::any::Any;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use guac_idpool::Pool;
use guac_render::{DynSink, RenderSocket};

use crate::handlers::{ClientHandlers, NoopHandlers};
use crate::user::UserId;

/// How many ids a freshly created layer/buffer/stream pool mints before it
/// starts recycling freed ones.
///
/// The original C pools grow without a configured floor; we pick a small
/// one here so IDs stay monotonically fresh for the first few allocations
/// of a connection (when a client is most likely to still be caching
/// resources by index from the handshake), without holding the free list
/// artificially empty forever. See `DESIGN.md` for the open-question
/// writeup.
const ID_REUSE_FLOOR: u64 = 64;

/// Lifecycle state of a [`Client`], observed cooperatively by the I/O
/// engine's input and output tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClientState {
    /// Normal operation; both I/O tasks keep running.
    Running = 0,
    /// A fatal error or a peer disconnect has been observed; both I/O tasks
    /// should wind down at their next cooperative checkpoint.
    Stopping = 1,
}

impl From<u8> for ClientState {
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Running,
            _ => Self::Stopping,
        }
    }
}

/// Per-connection state shared between a protocol plugin, the I/O engine,
/// and the listener.
///
/// Built on [`DynSink`] rather than being generic over the underlying
/// [`InstructionSink`](guac_render::InstructionSink): a plugin's handler
/// table (see [`crate::ClientHandlers`]) needs to be object-safe so it can
/// be installed and invoked without the plugin registry itself being
/// generic, and that in turn means the `Client` it is handed must name one
/// concrete (if type-erased) sink. Its rendering socket may still be a
/// plain TCP write half, a nested sub-channel, or a tee recording to disk —
/// those are erased behind the `Arc<dyn InstructionSink>` before the
/// `Client` is built.
pub struct Client {
    connection_id: String,
    socket: Arc<RenderSocket<DynSink>>,
    layers: Pool,
    buffers: Pool,
    streams: Pool,
    state: AtomicU8,
    last_sent_timestamp: AtomicI64,
    last_received_timestamp: AtomicI64,
    users: Mutex<Vec<UserId>>,
    handlers: Mutex<Arc<dyn ClientHandlers>>,
    plugin_data: Mutex<Option<Box<dyn Any + Send>>>,
    span: tracing::Span,
}

impl Client {
    /// Creates a new client for a connection identified by `connection_id`,
    /// wrapping `socket` for rendering output.
    #[must_use]
    pub fn new(connection_id: impl Into<String>, socket: RenderSocket<DynSink>) -> Self {
        let connection_id = connection_id.into();
        let span = tracing::info_span!("connection", id = %connection_id);
        let now = current_timestamp_millis();
        Self {
            connection_id,
            socket: Arc::new(socket),
            layers: Pool::new(ID_REUSE_FLOOR),
            buffers: Pool::new(ID_REUSE_FLOOR),
            streams: Pool::new(ID_REUSE_FLOOR),
            state: AtomicU8::new(ClientState::Running as u8),
            last_sent_timestamp: AtomicI64::new(now),
            last_received_timestamp: AtomicI64::new(now),
            users: Mutex::new(Vec::new()),
            handlers: Mutex::new(Arc::new(NoopHandlers)),
            plugin_data: Mutex::new(None),
            span,
        }
    }

    /// The identifier the daemon assigned this connection at accept time.
    #[must_use]
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// The rendering socket plugins and the I/O engine write through.
    #[must_use]
    pub fn socket(&self) -> &RenderSocket<DynSink> {
        &self.socket
    }

    /// A clone of the shared rendering socket handle.
    #[must_use]
    pub fn socket_handle(&self) -> Arc<RenderSocket<DynSink>> {
        Arc::clone(&self.socket)
    }

    /// The pool layer indices are allocated from.
    #[must_use]
    pub fn layers(&self) -> &Pool {
        &self.layers
    }

    /// The pool off-screen buffer indices are allocated from.
    ///
    /// Distinct from [`Self::layers`]: buffers and visible layers occupy
    /// disjoint id spaces (non-negative vs. negative) and must not share a
    /// counter, or allocating one would perturb the other's next id.
    #[must_use]
    pub fn buffers(&self) -> &Pool {
        &self.buffers
    }

    /// The pool stream indices are allocated from.
    #[must_use]
    pub fn streams(&self) -> &Pool {
        &self.streams
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ClientState {
        ClientState::from(self.state.load(Ordering::Acquire))
    }

    /// Whether the client is still running (convenience over [`Self::state`]).
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == ClientState::Running
    }

    /// Transitions the client to [`ClientState::Stopping`].
    ///
    /// Idempotent and safe to call from either I/O task or a handler.
    pub fn stop(&self) {
        self.state.store(ClientState::Stopping as u8, Ordering::Release);
    }

    /// Timestamp (milliseconds since the Unix epoch) of the last instruction
    /// sent to the client.
    #[must_use]
    pub fn last_sent_timestamp(&self) -> i64 {
        self.last_sent_timestamp.load(Ordering::Acquire)
    }

    /// Records `timestamp` as the last-sent time.
    pub fn set_last_sent_timestamp(&self, timestamp: i64) {
        self.last_sent_timestamp.store(timestamp, Ordering::Release);
    }

    /// Timestamp (milliseconds since the Unix epoch) of the last instruction
    /// received from the client.
    #[must_use]
    pub fn last_received_timestamp(&self) -> i64 {
        self.last_received_timestamp.load(Ordering::Acquire)
    }

    /// Records `timestamp` as the last-received time.
    pub fn set_last_received_timestamp(&self, timestamp: i64) {
        self.last_received_timestamp.store(timestamp, Ordering::Release);
    }

    /// Registers `user` as having joined the connection.
    pub fn add_user(&self, user: UserId) {
        self.users.lock().unwrap().push(user);
    }

    /// Removes `user` from the connection's user list, if present.
    pub fn remove_user(&self, user: &UserId) {
        self.users.lock().unwrap().retain(|existing| existing != user);
    }

    /// A snapshot of the users currently joined to this connection.
    #[must_use]
    pub fn users(&self) -> Vec<UserId> {
        self.users.lock().unwrap().clone()
    }

    /// Installs the handler table a plugin's init function built.
    pub fn set_handlers(&self, handlers: Arc<dyn ClientHandlers>) {
        *self.handlers.lock().unwrap() = handlers;
    }

    /// The currently installed handler table.
    #[must_use]
    pub fn handlers(&self) -> Arc<dyn ClientHandlers> {
        Arc::clone(&self.handlers.lock().unwrap())
    }

    /// Stashes plugin-private state, type-erased.
    ///
    /// Plugins receive `&Client` on every callback rather than a back
    /// pointer from their own state to the client, so there is no cycle to
    /// break on teardown; this slot is simply dropped when the `Client` is.
    pub fn set_plugin_data(&self, data: Box<dyn Any + Send>) {
        *self.plugin_data.lock().unwrap() = Some(data);
    }

    /// Runs `f` against the plugin-private slot, if one has been set and
    /// downcasts to `T`.
    pub fn with_plugin_data<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.plugin_data.lock().unwrap();
        guard.as_ref().and_then(|data| data.downcast_ref::<T>()).map(f)
    }

    /// The span every log line for this connection should be emitted
    /// within, so log output is automatically tagged with the connection
    /// identifier.
    #[must_use]
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }
}

/// Current time as milliseconds since the Unix epoch, saturating instead of
/// panicking if the system clock is set before 1970.
#[must_use]
pub fn current_timestamp_millis() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => i64::try_from(duration.as_millis()).unwrap_or(i64::MAX),
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use guac_codec::InstructionWriter;

    use super::*;

    fn test_client() -> Client {
        let sink: DynSink = Arc::new(InstructionWriter::new(Vec::new()));
        let socket = RenderSocket::new(sink);
        Client::new("conn-1", socket)
    }

    #[test]
    fn starts_running_and_can_be_stopped() {
        let client = test_client();
        assert!(client.is_running());
        client.stop();
        assert!(!client.is_running());
        assert_eq!(client.state(), ClientState::Stopping);
    }

    #[test]
    fn layer_and_buffer_pools_are_independent() {
        let client = test_client();
        let layer = client.layers().next();
        let buffer = client.buffers().next();
        assert_eq!(layer, 0);
        assert_eq!(buffer, 0);
    }

    #[test]
    fn user_list_tracks_join_and_leave() {
        let client = test_client();
        let user = UserId::new("user-1");
        client.add_user(user.clone());
        assert_eq!(client.users(), vec![user.clone()]);
        client.remove_user(&user);
        assert!(client.users().is_empty());
    }

    #[test]
    fn plugin_data_round_trips_through_downcast() {
        let client = test_client();
        client.set_plugin_data(Box::new(42u32));
        let doubled = client.with_plugin_data(|value: &u32| value * 2);
        assert_eq!(doubled, Some(84));
    }

    struct RecordingHandlers;

    #[async_trait]
    impl ClientHandlers for RecordingHandlers {
        fn wants_handle_messages(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn installed_handlers_replace_the_noop_default() {
        let client = test_client();
        assert!(!client.handlers().wants_handle_messages());
        client.set_handlers(Arc::new(RecordingHandlers));
        assert!(client.handlers().wants_handle_messages());
    }
}
