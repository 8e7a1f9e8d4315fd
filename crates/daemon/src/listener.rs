//! `bind → listen(backlog=5) → accept loop`, spawning an I/O engine for
//! each accepted connection.
//!
//! Grounded on `examples/original_source/guacd/src/daemon.c`'s `main`:
//! one listening socket, `listen(socket_fd, 5)`, then an unbounded accept
//! loop where each connection gets its own concurrent handler (a thread
//! there, a task here).

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use logging::LogLevel;
use logging_sink::{Record, Sink};
use socket2::{Domain, Socket, Type};
use tokio::net::{TcpListener, TcpStream};
use tracing::Instrument;

use guac_codec::InstructionReader;
use guac_codec::InstructionWriter;
use guac_ioengine::run_connection;
use guac_plugin::Registry;
use guac_render::{DynSink, RenderSocket};

use crate::error::DaemonError;
use crate::handshake::perform_handshake;
use crate::options::RuntimeOptions;

/// Backlog passed to `listen(2)`, matching the upstream daemon's fixed `5`.
const LISTEN_BACKLOG: i32 = 5;

/// Binds and listens according to `options`, without yet accepting.
fn bind(options: &RuntimeOptions) -> Result<TcpListener, DaemonError> {
    let addr: SocketAddr = format!("{}:{}", options.bind_host, options.port)
        .parse()
        .map_err(|_| DaemonError::InvalidAddress(options.bind_host.clone()))?;

    let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
    let socket = Socket::new(domain, Type::STREAM, None).map_err(DaemonError::Bind)?;
    socket.set_reuse_address(true).map_err(DaemonError::Bind)?;
    socket.bind(&addr.into()).map_err(DaemonError::Bind)?;
    socket.listen(LISTEN_BACKLOG).map_err(DaemonError::Bind)?;
    socket.set_nonblocking(true).map_err(DaemonError::Bind)?;

    TcpListener::from_std(socket.into()).map_err(DaemonError::Bind)
}

/// Runs the accept loop forever, handing each connection off to a spawned
/// task. Returns only on a fatal accept error, matching the upstream
/// daemon's decision to exit the whole process rather than limp along with
/// a broken listening socket.
///
/// `sink` receives the same severity-tagged lines `tracing` does for the
/// events an operator's log-monitoring tooling is most likely to alert on
/// (the listening announcement, a bind/accept failure, a connection ending
/// in error) independent of whichever `tracing` subscriber is installed.
pub async fn run(
    options: RuntimeOptions,
    registry: Arc<Registry>,
    sink: Arc<dyn Sink>,
) -> Result<(), DaemonError> {
    let listener = bind(&options)?;
    tracing::info!(bind_host = %options.bind_host, port = options.port, "guacd listening");
    sink.log(&Record::new(
        LogLevel::Info,
        format!("guacd listening on {}:{}", options.bind_host, options.port),
    ));

    let next_id = Arc::new(AtomicU64::new(1));

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(error) => {
                sink.log(&Record::new(LogLevel::Error, format!("error accepting connection: {error}")));
                return Err(DaemonError::Accept(error));
            }
        };
        let registry = Arc::clone(&registry);
        let connection_id = format!("conn-{}", next_id.fetch_add(1, Ordering::Relaxed));
        let connection_sink = Arc::clone(&sink);

        tokio::spawn(async move {
            if let Err(error) = serve(stream, peer, connection_id, registry).await {
                tracing::warn!(%error, "connection ended with an error");
                connection_sink.log(&Record::new(LogLevel::Warning, format!("connection ended with an error: {error}")));
            }
        });
    }
}

async fn serve(
    stream: TcpStream,
    peer: SocketAddr,
    connection_id: String,
    registry: Arc<Registry>,
) -> Result<(), crate::error::HandshakeError> {
    let span = tracing::info_span!("connection", id = %connection_id, peer = %peer);

    async move {
        let _ = stream.set_nodelay(true);
        let (read_half, write_half) = stream.into_split();

        let sink: DynSink = Arc::new(InstructionWriter::new(write_half));
        let socket = RenderSocket::new(sink);
        let mut reader = InstructionReader::new(read_half);

        tracing::info!("accepted connection");

        let client = perform_handshake(&connection_id, &mut reader, socket, &registry).await?;
        tracing::info!("handshake complete");

        run_connection(Arc::new(client), reader).await;
        tracing::info!("connection closed");
        Ok(())
    }
    .instrument(span)
    .await
}
