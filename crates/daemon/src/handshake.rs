//! The protocol-select / argument-exchange handshake.
//!
//! Grounded on spec §4.8 and the `guac_client` handshake read out of
//! `examples/original_source/guacd/src/client.c`'s `guac_get_client`: the
//! server learns the requested protocol from `select`, advertises that
//! protocol's argument schema via `args`, then waits out the client's
//! `size`/capability lines before consuming `connect` and handing the
//! gathered arguments to the plugin's init function.

use std::time::Duration;

use tokio::io::AsyncRead;

use guac_client::{Client, UserId};
use guac_codec::{Instruction, InstructionReader};
use guac_plugin::Registry;
use guac_render::{DynSink, RenderSocket};

use crate::error::HandshakeError;

/// How long the handshake waits for each instruction.
///
/// Reuses the same deadline as the steady-state input task
/// ([`guac_ioengine::INPUT_TIMEOUT`]) rather than declaring a second one;
/// the handshake is just the input task's first few reads.
const HANDSHAKE_TIMEOUT: Duration = guac_ioengine::INPUT_TIMEOUT;

/// Outbound `error` messages are capped to this many bytes before being
/// sent, so a handler-supplied or upstream-reported message of unbounded
/// length never blows past what a client is expected to render in a single
/// error dialog.
const MAX_ERROR_MESSAGE_BYTES: usize = 256;

/// Runs the handshake over `reader`/`socket`, consuming `socket` into a
/// fully initialized [`Client`] on success.
///
/// On any failure this sends `error,<msg>,<status>` followed by
/// `disconnect;` on the socket (best-effort; a failure doing so is only
/// logged) before returning `Err`.
pub async fn perform_handshake<R>(
    connection_id: &str,
    reader: &mut InstructionReader<R>,
    socket: RenderSocket<DynSink>,
    registry: &Registry,
) -> Result<Client, HandshakeError>
where
    R: AsyncRead + Unpin + Send,
{
    let select = match read_expected(reader, "select").await {
        Ok(instruction) => instruction,
        Err(error) => return fail(socket, error).await,
    };

    let Some(protocol_name) = select.args.into_iter().next() else {
        return fail(socket, HandshakeError::MissingProtocol).await;
    };

    let plugin = match registry.open(&protocol_name) {
        Ok(plugin) => plugin,
        Err(_) => {
            let names = registry.protocol_names();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let available = guac_util::join(&refs, ", ");
            return fail(socket, HandshakeError::UnknownProtocol { name: protocol_name, available }).await;
        }
    };

    let schema = plugin.argument_schema();
    let schema_refs: Vec<&str> = schema.iter().map(String::as_str).collect();
    if let Err(error) = socket.send_args(&schema_refs).await {
        tracing::warn!(%error, "failed to send handshake args");
        return Err(HandshakeError::Io);
    }
    let _ = socket.flush().await;

    if let Err(error) = read_expected(reader, "size").await {
        return fail(socket, error).await;
    }

    let connect = loop {
        let instruction = match reader.read_instruction(HANDSHAKE_TIMEOUT).await {
            Ok(instruction) => instruction,
            Err(error) => return fail(socket, HandshakeError::Read(error)).await,
        };
        match instruction.opcode.as_str() {
            // Capability advertisements; the core has no use for them but a
            // client is free to send any number before `connect`.
            "audio" | "video" | "image" => continue,
            "connect" => break instruction,
            other => {
                return fail(
                    socket,
                    HandshakeError::UnexpectedOpcode { expected: "connect", got: other.to_owned() },
                )
                .await;
            }
        }
    };

    let argv = connect.args;

    if let Some((mac, broadcast)) = plugin.wake_on_lan_target(&argv) {
        if let Err(error) = guac_util::wake(mac, broadcast).await {
            tracing::warn!(%error, "failed to send Wake-on-LAN packet");
        }
    }

    let client = Client::new(connection_id, socket);

    if let Err(error) = registry.init_client(&protocol_name, &client, &argv).await {
        let error = HandshakeError::Init(error);
        let (message, status) = error.wire_report();
        notify(&client, &message, status).await;
        return Err(error);
    }

    let primary_user = UserId::new(connection_id);
    if let Err(status) = client.handlers().join(&client, &primary_user, &argv).await {
        notify(&client, "connect arguments rejected", status).await;
        return Err(HandshakeError::JoinRejected(status));
    }
    client.add_user(primary_user);

    if let Err(error) = client.socket().send_ready(connection_id).await {
        tracing::warn!(%error, "failed to send ready");
        return Err(HandshakeError::Io);
    }
    let _ = client.socket().flush().await;

    Ok(client)
}

async fn read_expected<R>(
    reader: &mut InstructionReader<R>,
    expected: &'static str,
) -> Result<Instruction, HandshakeError>
where
    R: AsyncRead + Unpin + Send,
{
    let instruction =
        reader.read_instruction(HANDSHAKE_TIMEOUT).await.map_err(HandshakeError::Read)?;
    if instruction.opcode != expected {
        return Err(HandshakeError::UnexpectedOpcode { expected, got: instruction.opcode });
    }
    Ok(instruction)
}

async fn fail(socket: RenderSocket<DynSink>, error: HandshakeError) -> Result<Client, HandshakeError> {
    let (message, status) = error.wire_report();
    let message = guac_util::truncate_utf8_safe(&message, MAX_ERROR_MESSAGE_BYTES);
    if let Err(send_error) = socket.send_error(message, status).await {
        tracing::warn!(error = %send_error, "failed to send handshake error");
    } else {
        let _ = socket.send_disconnect().await;
        let _ = socket.flush().await;
    }
    Err(error)
}

async fn notify(client: &Client, message: &str, status: guac_util::GuacStatus) {
    let message = guac_util::truncate_utf8_safe(message, MAX_ERROR_MESSAGE_BYTES);
    if let Err(error) = client.socket().send_error(message, status).await {
        tracing::warn!(%error, "failed to send handshake error");
        return;
    }
    let _ = client.socket().send_disconnect().await;
    let _ = client.socket().flush().await;
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use async_trait::async_trait;
    use guac_codec::InstructionWriter;
    use guac_plugin::PluginError;

    use super::*;

    struct Echo {
        schema: Vec<String>,
    }

    #[async_trait]
    impl guac_plugin::Protocol for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn argument_schema(&self) -> &[String] {
            &self.schema
        }

        async fn init_client(&self, client: &Client, _argv: &[String]) -> Result<(), PluginError> {
            client.set_handlers(Arc::new(guac_client::NoopHandlers));
            Ok(())
        }
    }

    fn registry_with_echo() -> Registry {
        let registry = Registry::new();
        registry
            .register(Arc::new(Echo { schema: vec!["hostname".into(), "port".into()] }))
            .unwrap();
        registry
    }

    fn reader_socket_for(
        wire: &'static str,
    ) -> (InstructionReader<Cursor<Vec<u8>>>, RenderSocket<DynSink>, Arc<std::sync::Mutex<Vec<u8>>>) {
        let collected = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink: DynSink = Arc::new(InstructionWriter::new(CollectingWriter(Arc::clone(&collected))));
        let socket = RenderSocket::new(sink);
        let reader = InstructionReader::new(Cursor::new(wire.as_bytes().to_vec()));
        (reader, socket, collected)
    }

    struct CollectingWriter(Arc<std::sync::Mutex<Vec<u8>>>);

    impl tokio::io::AsyncWrite for CollectingWriter {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            buf: &[u8],
        ) -> std::task::Poll<Result<usize, std::io::Error>> {
            self.0.lock().unwrap().extend_from_slice(buf);
            std::task::Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), std::io::Error>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), std::io::Error>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn successful_handshake_installs_handlers_and_sends_ready() {
        let wire = concat!(
            "6.select,4.echo;",
            "4.size,3.800,3.600,2.96;",
            "7.connect,4.host,4.3389;",
        );
        let (mut reader, socket, out) = reader_socket_for(wire);
        let registry = registry_with_echo();

        let client = perform_handshake("conn-1", &mut reader, socket, &registry).await.unwrap();
        assert_eq!(client.users(), vec![UserId::new("conn-1")]);

        let written = String::from_utf8(out.lock().unwrap().clone()).unwrap();
        assert!(written.contains("4.args"));
        assert!(written.contains("5.ready"));
    }

    #[tokio::test]
    async fn unknown_protocol_sends_error_then_disconnect() {
        let wire = "6.select,7.unknown;";
        let (mut reader, socket, out) = reader_socket_for(wire);
        let registry = registry_with_echo();

        let error = perform_handshake("conn-1", &mut reader, socket, &registry).await.unwrap_err();
        assert!(matches!(
            &error,
            HandshakeError::UnknownProtocol { name, available } if name == "unknown" && available == "echo"
        ));

        let written = String::from_utf8(out.lock().unwrap().clone()).unwrap();
        assert!(written.contains("5.error"));
        assert!(written.contains("10.disconnect"));
    }

    #[tokio::test]
    async fn select_without_a_protocol_name_is_rejected() {
        let wire = "6.select;";
        let (mut reader, socket, _out) = reader_socket_for(wire);
        let registry = registry_with_echo();

        let error = perform_handshake("conn-1", &mut reader, socket, &registry).await.unwrap_err();
        assert!(matches!(error, HandshakeError::MissingProtocol));
    }

    #[tokio::test]
    async fn capability_lines_between_size_and_connect_are_skipped() {
        let wire = concat!(
            "6.select,4.echo;",
            "4.size,3.800,3.600,2.96;",
            "5.audio,9.audio/L16;",
            "7.connect,4.host,4.3389;",
        );
        let (mut reader, socket, _out) = reader_socket_for(wire);
        let registry = registry_with_echo();

        perform_handshake("conn-1", &mut reader, socket, &registry).await.unwrap();
    }
}
