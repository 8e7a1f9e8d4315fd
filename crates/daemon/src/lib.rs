//! `guacd`'s listener, handshake, and CLI argument parsing.
//!
//! Daemonization itself (detaching from the controlling terminal, pid-file
//! bookkeeping) is named as an external-collaborator concern the core does
//! not own; see [`write_pid_file`] and the `-f`/`-p` flags in [`options`]
//! for what this crate does carry: accepting the flags and honoring the
//! pid-file path a supervisor (systemd, a process manager) would read.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod error;
mod handshake;
mod listener;
/// `-l`/`-b`/`-p`/`-f`/`-L` argument parsing.
pub mod options;

pub use error::{DaemonError, HandshakeError};
pub use listener::run;
pub use options::{RuntimeOptions, from_args};

use std::io::Write;
use std::path::Path;

/// Writes the current process id to `path`, truncating any existing file.
///
/// # Errors
///
/// Returns the underlying I/O error if `path` cannot be created or written.
pub fn write_pid_file(path: &Path) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "{}", std::process::id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_pid_file_contains_the_current_pid() {
        let dir = std::env::temp_dir().join(format!(
            "guacd-daemon-test-{}-{}",
            std::process::id(),
            std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap().as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("guacd.pid");

        write_pid_file(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), std::process::id().to_string());
        let _ = std::fs::remove_dir_all(dir);
    }
}
