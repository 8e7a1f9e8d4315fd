//! Per-task error slot.
//!
//! Replaces the process-wide `guac_error`/`guac_error_message` globals from
//! `examples/original_source/libguac/src/error.c` (and the thread-local
//! variant exercised in `thread_local_storage_error_compat.c`) with a
//! task-local cell, since each connection's input and output tasks are
//! tokio tasks rather than OS threads. The last value set is read once,
//! when a task decides to disconnect, to compose the outbound `error`
//! frame.

use std::cell::Cell;

use crate::status::GuacStatus;

tokio::task_local! {
    static SLOT: Cell<Option<(GuacStatus, &'static str)>>;
}

/// Records `status`/`message` as this task's last error. Overwrites any
/// previously recorded value.
///
/// # Panics
///
/// Panics if called outside of [`with_error_slot`]'s scope.
pub fn set_error(status: GuacStatus, message: &'static str) {
    SLOT.with(|cell| cell.set(Some((status, message))));
}

/// Reads back this task's last recorded error, if any.
///
/// # Panics
///
/// Panics if called outside of [`with_error_slot`]'s scope.
#[must_use]
pub fn last_error() -> Option<(GuacStatus, &'static str)> {
    SLOT.with(Cell::get)
}

/// Runs `fut` with a fresh error slot scoped to it. Every connection's
/// input and output task should be spawned inside this scope so
/// [`set_error`]/[`last_error`] have somewhere to write.
pub async fn with_error_slot<F: std::future::Future>(fut: F) -> F::Output {
    SLOT.scope(Cell::new(None), fut).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_and_reads_back_last_error() {
        with_error_slot(async {
            assert_eq!(last_error(), None);
            set_error(GuacStatus::BadState, "client disconnected mid-handshake");
            assert_eq!(last_error(), Some((GuacStatus::BadState, "client disconnected mid-handshake")));
            set_error(GuacStatus::Io, "broken pipe");
            assert_eq!(last_error(), Some((GuacStatus::Io, "broken pipe")));
        })
        .await;
    }

    #[tokio::test]
    async fn scopes_are_independent_across_tasks() {
        let a = tokio::spawn(with_error_slot(async {
            set_error(GuacStatus::NotFound, "no such protocol");
            last_error()
        }));
        let b = tokio::spawn(with_error_slot(async {
            last_error()
        }));

        assert_eq!(a.await.unwrap(), Some((GuacStatus::NotFound, "no such protocol")));
        assert_eq!(b.await.unwrap(), None);
    }
}
