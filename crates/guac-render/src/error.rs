//! Errors produced by the rendering socket hierarchy.

use std::fmt;
use std::io;

/// A failure writing to, or flushing, some layer of the sink hierarchy
/// (direct transport, nested multiplexer, tee, or recording file).
#[derive(Debug)]
pub enum SinkError {
    /// The underlying transport returned an I/O error.
    Io(io::Error),
    /// The sink was already marked errored by a prior failed write.
    Errored,
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "rendering socket I/O error: {e}"),
            Self::Errored => write!(f, "rendering socket already errored"),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Errored => None,
        }
    }
}

impl From<guac_codec::WriteError> for SinkError {
    fn from(value: guac_codec::WriteError) -> Self {
        match value {
            guac_codec::WriteError::Io(e) => Self::Io(e),
        }
    }
}

impl From<io::Error> for SinkError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}
