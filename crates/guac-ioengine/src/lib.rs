//! The per-connection I/O engine: an input task reading and dispatching
//! client instructions, and an output task driving the sync heartbeat and
//! server-message backpressure gate, run concurrently and supervised as a
//! pair.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod constants;
mod input;
mod output;
mod run;

pub use constants::{INPUT_TIMEOUT, MESSAGE_HANDLE_FREQUENCY, SYNC_FREQUENCY, SYNC_THRESHOLD};
pub use input::run_input_task;
pub use output::run_output_task;
pub use run::run_connection;
