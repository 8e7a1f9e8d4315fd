//! Spawns and supervises the input/output task pair for one connection.

use std::sync::Arc;

use tokio::io::AsyncRead;
use tracing::Instrument;

use guac_client::Client;
use guac_codec::InstructionReader;

use crate::input::run_input_task;
use crate::output::run_output_task;

/// Spawns the input and output tasks for `client` and waits for both to
/// finish.
///
/// Mirrors `examples/original_source/guacd/src/client.c`'s
/// `guac_start_client`: both tasks run concurrently and either one stopping
/// the client causes the other to notice at its next cooperative checkpoint
/// and wind down too. A panic inside either task is caught by its
/// `JoinHandle` rather than taking the process down, is logged, and also
/// stops the client so the surviving task does not run forever. Each task
/// runs inside its own [`with_error_slot`](guac_util::with_error_slot) scope;
/// once both have stopped the plugin's `free` handler runs, completing the
/// lifecycle a connection's destruction is documented to follow.
pub async fn run_connection<R>(client: Arc<Client>, reader: InstructionReader<R>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let span = client.span().clone();

    let output_client = Arc::clone(&client);
    let output_span = span.clone();
    let output_handle = tokio::spawn(guac_util::with_error_slot(async move {
        run_output_task(output_client).instrument(output_span).await
    }));

    let input_client = Arc::clone(&client);
    let input_handle = tokio::spawn(guac_util::with_error_slot(async move {
        run_input_task(input_client, reader).instrument(span).await
    }));

    if let Err(panic) = input_handle.await {
        tracing::error!(%panic, "input task panicked");
        client.stop();
    }
    if let Err(panic) = output_handle.await {
        tracing::error!(%panic, "output task panicked");
        client.stop();
    }

    if let Err(status) = client.handlers().free(&client).await {
        tracing::warn!(%status, "free handler reported an error");
    }
}
