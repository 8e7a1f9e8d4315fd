//! The output task: sync heartbeat plus server-message backpressure gate.
//!
//! A direct async translation of
//! `examples/original_source/guacd/src/client.c`'s
//! `__guac_client_output_thread`.

use std::sync::Arc;

use guac_client::{Client, current_timestamp_millis};
use guac_util::GuacStatus;

use crate::constants::{MESSAGE_HANDLE_FREQUENCY, SYNC_FREQUENCY, SYNC_THRESHOLD};

/// Runs the output loop for `client` until it stops running or a write
/// fails.
///
/// On any I/O failure this stops the client (so the sibling input task
/// also winds down) and returns; it never panics on a send failure.
pub async fn run_output_task(client: Arc<Client>) {
    let mut last_ping = current_timestamp_millis();

    while client.is_running() {
        let now = current_timestamp_millis();

        if now - last_ping > SYNC_FREQUENCY.as_millis() as i64 {
            last_ping = now;
            if let Err(error) = client.socket().send_sync(client.last_sent_timestamp()).await {
                tracing::warn!(%error, "error sending sync instruction");
                guac_util::set_error(GuacStatus::OutputError, "error sending sync instruction");
                client.stop();
                return;
            }
            if let Err(error) = client.socket().flush().await {
                tracing::warn!(%error, "error flushing output");
                guac_util::set_error(GuacStatus::OutputError, "error flushing output");
                client.stop();
                return;
            }
        }

        let handlers = client.handlers();
        if handlers.wants_handle_messages() {
            if client.last_sent_timestamp() - client.last_received_timestamp() < SYNC_THRESHOLD.as_millis() as i64 {
                if let Err(status) = handlers.handle_messages(&client).await {
                    tracing::warn!(%status, "error handling server messages");
                    guac_util::set_error(status, "error handling server messages");
                    client.stop();
                    return;
                }

                let sent = current_timestamp_millis();
                client.set_last_sent_timestamp(sent);
                if let Err(error) = client.socket().send_sync(sent).await {
                    tracing::warn!(%error, "error sending sync instruction");
                    guac_util::set_error(GuacStatus::OutputError, "error sending sync instruction");
                    client.stop();
                    return;
                }
                if let Err(error) = client.socket().flush().await {
                    tracing::warn!(%error, "error flushing output");
                    guac_util::set_error(GuacStatus::OutputError, "error flushing output");
                    client.stop();
                    return;
                }
            } else {
                tokio::time::sleep(MESSAGE_HANDLE_FREQUENCY).await;
            }
        } else {
            tokio::time::sleep(SYNC_FREQUENCY).await;
        }
    }

    client.stop();
}
