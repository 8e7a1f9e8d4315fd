//! Errors from binding, accepting, and handshaking connections.

use std::fmt;
use std::io;

use guac_codec::ReadError;
use guac_plugin::PluginError;
use guac_util::GuacStatus;

/// A failure that ends the daemon's listening loop entirely.
#[derive(Debug)]
pub enum DaemonError {
    /// The bind address could not be parsed.
    InvalidAddress(String),
    /// `bind`/`listen` on the configured address/port failed.
    Bind(io::Error),
    /// `accept` failed; per the upstream daemon this is fatal to the whole
    /// process rather than just the one connection.
    Accept(io::Error),
    /// Writing the pid file failed.
    PidFile(io::Error),
}

impl fmt::Display for DaemonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAddress(addr) if guac_util::count_occurrences(addr, ':') > 1 => {
                write!(f, "invalid bind address {addr:?} (IPv6 literals need brackets, e.g. \"[{addr}]\")")
            }
            Self::InvalidAddress(addr) => write!(f, "invalid bind address {addr:?}"),
            Self::Bind(e) => write!(f, "error binding socket: {e}"),
            Self::Accept(e) => write!(f, "error accepting connection: {e}"),
            Self::PidFile(e) => write!(f, "error writing pid file: {e}"),
        }
    }
}

impl std::error::Error for DaemonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bind(e) | Self::Accept(e) | Self::PidFile(e) => Some(e),
            Self::InvalidAddress(_) => None,
        }
    }
}

/// A failure during the protocol-select/argument-exchange handshake,
/// before (or while) a [`guac_client::Client`] is being initialized.
#[derive(Debug)]
pub enum HandshakeError {
    /// A read failed, timed out, or the peer disconnected before the
    /// handshake completed.
    Read(ReadError),
    /// `select` was sent without a protocol name.
    MissingProtocol,
    /// An instruction arrived where a specific opcode was required.
    UnexpectedOpcode {
        /// The opcode that was required at this point in the handshake.
        expected: &'static str,
        /// The opcode actually received.
        got: String,
    },
    /// `select` named a protocol with no registered plugin.
    UnknownProtocol {
        /// The protocol name the client requested.
        name: String,
        /// Every protocol name currently registered, comma-joined, for the
        /// diagnostic text (empty if nothing is registered at all).
        available: String,
    },
    /// The plugin's own `init_client` rejected the connection.
    Init(PluginError),
    /// The plugin's `join` handler rejected the connect arguments.
    JoinRejected(GuacStatus),
    /// Writing a handshake response to the client failed.
    Io,
}

impl HandshakeError {
    /// The message and status to report on the wire via `error,<msg>,<status>`
    /// before disconnecting, for the errors that occur before a client
    /// object exists to report through normally.
    pub(crate) fn wire_report(&self) -> (String, GuacStatus) {
        match self {
            Self::Read(e) => (e.to_string(), GuacStatus::Protocol),
            Self::MissingProtocol => ("select requires a protocol name".to_owned(), GuacStatus::BadArgument),
            Self::UnexpectedOpcode { expected, got } => {
                (format!("expected '{expected}', got '{got}'"), GuacStatus::BadState)
            }
            Self::UnknownProtocol { name, available } if available.is_empty() => {
                (format!("no such protocol: {name}"), GuacStatus::NotFound)
            }
            Self::UnknownProtocol { name, available } => {
                (format!("no such protocol: {name} (available: {available})"), GuacStatus::NotFound)
            }
            Self::Init(e) => (e.to_string(), GuacStatus::BadArgument),
            Self::JoinRejected(status) => ("connect arguments rejected".to_owned(), *status),
            Self::Io => ("i/o error during handshake".to_owned(), GuacStatus::Io),
        }
    }
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (message, status) = self.wire_report();
        write!(f, "{message} ({status})")
    }
}

impl std::error::Error for HandshakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read(e) => Some(e),
            Self::Init(e) => Some(e),
            Self::MissingProtocol
            | Self::UnexpectedOpcode { .. }
            | Self::UnknownProtocol { .. }
            | Self::JoinRejected(_)
            | Self::Io => None,
        }
    }
}
