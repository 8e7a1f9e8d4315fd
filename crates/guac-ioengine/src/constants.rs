//! Timing constants governing the input and output tasks.
//!
//! Grounded on `examples/original_source/guacd/include/client.h`'s
//! `GUAC_SYNC_FREQUENCY`, `GUAC_SYNC_THRESHOLD`, and
//! `GUAC_SERVER_MESSAGE_HANDLE_FREQUENCY`, plus `GUAC_USEC_TIMEOUT` in
//! `guacd/src/client.c`'s input loop.

use std::time::Duration;

/// How long the input task waits for a complete instruction before treating
/// the connection as dead.
///
/// Reuses `guac_codec::USEC_TIMEOUT` rather than redeclaring the same
/// deadline under a second name.
pub const INPUT_TIMEOUT: Duration = guac_codec::USEC_TIMEOUT;

/// How often the output task pings the client with a repeat of the last
/// `sync` timestamp when no server messages are pending.
pub const SYNC_FREQUENCY: Duration = Duration::from_millis(5000);

/// The output task only calls a plugin's `handle_messages` while the client
/// has acknowledged sync within this many milliseconds of the last one sent;
/// otherwise it backs off to avoid flooding a client that is still catching
/// up.
pub const SYNC_THRESHOLD: Duration = Duration::from_millis(500);

/// Poll interval while the output task is backed off waiting for the client
/// to catch up on an old sync.
pub const MESSAGE_HANDLE_FREQUENCY: Duration = Duration::from_millis(50);
