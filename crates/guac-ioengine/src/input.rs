//! The input task: read instructions, dispatch to the client's handler
//! table.
//!
//! A direct async translation of
//! `examples/original_source/guacd/src/client.c`'s
//! `__guac_client_input_thread`, generalized to decode incoming
//! `clipboard`/`blob`/`end` streams (clipboard is the only stream direction
//! a client initiates toward the server in this daemon). Every exit from
//! the loop calls the installed [`ClientHandlers::leave`](guac_client::ClientHandlers::leave)
//! handler for the primary user before stopping the client, and a failure
//! exit also records the status in this task's error slot and sends it
//! back as the outbound `error` instruction.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tokio::io::AsyncRead;

use guac_client::{Client, UserId};
use guac_codec::{Instruction, InstructionReader, ReadError};
use guac_util::{Clipboard, GuacStatus};

use crate::constants::INPUT_TIMEOUT;

/// Maximum size of a single incoming clipboard transfer.
const INCOMING_CLIPBOARD_CAPACITY: usize = 10 * 1024 * 1024;

/// Outbound `error` messages are capped to this many bytes, matching the
/// bound the handshake applies to its own error frames.
const MAX_ERROR_MESSAGE_BYTES: usize = 256;

/// Runs the input loop for `client`, reading instructions off `reader`
/// until the client stops, the peer disconnects, or the read times out.
///
/// Every instruction updates `last_received_timestamp` before dispatch, so
/// a plugin handler that itself never touches the timestamp still keeps
/// the output task's sync-threshold gate accurate.
pub async fn run_input_task<R>(client: Arc<Client>, mut reader: InstructionReader<R>)
where
    R: AsyncRead + Unpin + Send,
{
    let mut streams: HashMap<u32, Clipboard> = HashMap::new();
    let primary_user = UserId::new(client.connection_id());

    while client.is_running() {
        let instruction = match reader.read_instruction(INPUT_TIMEOUT).await {
            Ok(instruction) => instruction,
            Err(ReadError::Timeout) => {
                fail(&client, &primary_user, GuacStatus::InputTimeout, "timed out waiting for an instruction").await;
                return;
            }
            Err(ReadError::Closed { .. }) => {
                tracing::debug!("client closed the connection");
                depart(&client, &primary_user).await;
                return;
            }
            Err(error) => {
                tracing::warn!(%error, "error reading instruction");
                fail(&client, &primary_user, GuacStatus::Protocol, "error reading instruction").await;
                return;
            }
        };

        client.set_last_received_timestamp(guac_client::current_timestamp_millis());

        if instruction.opcode == "disconnect" {
            tracing::debug!("client requested disconnect");
            depart(&client, &primary_user).await;
            return;
        }

        if let Err((status, opcode)) = dispatch(&client, &primary_user, &instruction, &mut streams).await {
            tracing::warn!(opcode, %status, "client instruction handler error");
            fail(&client, &primary_user, status, "instruction handler error").await;
            return;
        }
    }
}

/// Calls the `leave` handler for a user departing without error, then stops
/// the client.
async fn depart(client: &Client, user: &UserId) {
    if let Err(status) = client.handlers().leave(client, user).await {
        tracing::warn!(%status, "leave handler reported an error");
    }
    client.stop();
}

/// Records `status`/`message` in this task's error slot, calls `leave` for
/// the departing user, composes and sends the outbound `error` frame from
/// the slot, then stops the client.
async fn fail(client: &Client, user: &UserId, status: GuacStatus, message: &'static str) {
    guac_util::set_error(status, message);
    if let Err(handler_status) = client.handlers().leave(client, user).await {
        tracing::warn!(status = %handler_status, "leave handler reported an error");
    }

    if let Some((status, message)) = guac_util::last_error() {
        let message = guac_util::truncate_utf8_safe(message, MAX_ERROR_MESSAGE_BYTES);
        if let Err(error) = client.socket().send_error(message, status).await {
            tracing::warn!(%error, "failed to send error frame");
        } else {
            let _ = client.socket().send_disconnect().await;
            let _ = client.socket().flush().await;
        }
    }

    client.stop();
}

/// Dispatches one instruction. Returns `Err((status, opcode))` (the
/// reported status and the failing opcode, for logging and for the error
/// slot) if the handler it invoked reported an error.
async fn dispatch(
    client: &Client,
    primary_user: &UserId,
    instruction: &Instruction,
    streams: &mut HashMap<u32, Clipboard>,
) -> Result<(), (GuacStatus, &'static str)> {
    let handlers = client.handlers();

    match instruction.opcode.as_str() {
        "sync" => Ok(()),

        "mouse" => {
            let [x, y, mask] = parse_args(&instruction.args) else { return Ok(()) };
            handlers
                .mouse(client, primary_user, x, y, mask as u32)
                .await
                .map_err(|status| (status, "mouse"))
        }

        "key" => {
            let [keysym, pressed] = parse_args(&instruction.args) else { return Ok(()) };
            handlers
                .key(client, primary_user, keysym, pressed != 0)
                .await
                .map_err(|status| (status, "key"))
        }

        "size" => {
            let [width, height] = parse_args(&instruction.args) else { return Ok(()) };
            handlers
                .size(client, primary_user, width as u32, height as u32)
                .await
                .map_err(|status| (status, "size"))
        }

        "clipboard" => {
            let Some(stream) = instruction.args.first().and_then(|s| s.parse::<u32>().ok()) else {
                return Ok(());
            };
            let mimetype = instruction.args.get(1).cloned().unwrap_or_default();
            let mut clipboard = Clipboard::new(INCOMING_CLIPBOARD_CAPACITY);
            clipboard.reset(&mimetype);
            streams.insert(stream, clipboard);
            Ok(())
        }

        "blob" => {
            let Some(stream) = instruction.args.first().and_then(|s| s.parse::<u32>().ok()) else {
                return Ok(());
            };
            let Some(chunk) = instruction.args.get(1) else { return Ok(()) };
            if let (Some(entry), Ok(bytes)) = (streams.get_mut(&stream), STANDARD.decode(chunk)) {
                entry.append(&bytes);
            }
            Ok(())
        }

        "end" => {
            let Some(stream) = instruction.args.first().and_then(|s| s.parse::<u32>().ok()) else {
                return Ok(());
            };
            if let Some(entry) = streams.remove(&stream) {
                handlers
                    .clipboard(client, primary_user, entry.mimetype(), entry.data())
                    .await
                    .map_err(|status| (status, "clipboard"))?;
            }
            Ok(())
        }

        other => {
            tracing::debug!(opcode = other, "ignoring unrecognized instruction");
            Ok(())
        }
    }
}

fn parse_args<const N: usize>(args: &[String]) -> Option<[i32; N]> {
    if args.len() < N {
        return None;
    }
    let mut out = [0i32; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.parse().ok()?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use async_trait::async_trait;
    use guac_client::ClientState;
    use guac_codec::InstructionWriter;
    use guac_render::{DynSink, RenderSocket};
    use guac_util::GuacStatus;

    use super::*;

    fn client_with(data: &[u8]) -> (Arc<Client>, InstructionReader<Cursor<Vec<u8>>>) {
        let sink: DynSink = Arc::new(InstructionWriter::new(Vec::new()));
        let socket = RenderSocket::new(sink);
        let client = Arc::new(Client::new("conn-1", socket));
        let reader = InstructionReader::new(Cursor::new(data.to_vec()));
        (client, reader)
    }

    struct RecordingHandlers {
        moved: tokio::sync::Mutex<Vec<(i32, i32, u32)>>,
        clipboards: tokio::sync::Mutex<Vec<(String, Vec<u8>)>>,
    }

    #[async_trait]
    impl guac_client::ClientHandlers for RecordingHandlers {
        async fn mouse(
            &self,
            _client: &Client,
            _user: &UserId,
            x: i32,
            y: i32,
            button_mask: u32,
        ) -> Result<(), GuacStatus> {
            self.moved.lock().await.push((x, y, button_mask));
            Ok(())
        }

        async fn clipboard(
            &self,
            _client: &Client,
            _user: &UserId,
            mimetype: &str,
            data: &[u8],
        ) -> Result<(), GuacStatus> {
            self.clipboards.lock().await.push((mimetype.to_owned(), data.to_vec()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn mouse_instruction_invokes_handler_and_stops_on_disconnect() {
        let wire = b"5.mouse,1.5,2.10,1.1;10.disconnect;";
        let (client, reader) = client_with(wire);

        let handlers = Arc::new(RecordingHandlers {
            moved: tokio::sync::Mutex::new(Vec::new()),
            clipboards: tokio::sync::Mutex::new(Vec::new()),
        });
        client.set_handlers(handlers.clone());

        tokio::time::timeout(Duration::from_secs(1), run_input_task(client.clone(), reader))
            .await
            .unwrap();

        assert_eq!(*handlers.moved.lock().await, vec![(5, 10, 1)]);
        assert_eq!(client.state(), ClientState::Stopping);
    }

    #[tokio::test]
    async fn clipboard_stream_accumulates_across_blobs_then_fires_on_end() {
        let wire = concat!(
            "9.clipboard,1.0,10.text/plain;",
            "4.blob,1.0,8.aGVsbG8=;",
            "3.end,1.0;",
            "10.disconnect;",
        )
        .as_bytes();
        let (client, reader) = client_with(wire);

        let handlers = Arc::new(RecordingHandlers {
            moved: tokio::sync::Mutex::new(Vec::new()),
            clipboards: tokio::sync::Mutex::new(Vec::new()),
        });
        client.set_handlers(handlers.clone());

        tokio::time::timeout(Duration::from_secs(1), run_input_task(client.clone(), reader))
            .await
            .unwrap();

        let clipboards = handlers.clipboards.lock().await;
        assert_eq!(clipboards.len(), 1);
        assert_eq!(clipboards[0].0, "text/plain");
        assert_eq!(clipboards[0].1, b"hello");
    }
}
