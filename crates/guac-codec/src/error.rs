//! Error types for the instruction codec.

use std::fmt;

/// Failure produced by the streaming parser while assembling an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A `.` was seen before any length digit.
    MissingLength,
    /// A byte that is neither a digit nor `.` appeared while reading a length.
    InvalidLength(u8),
    /// A byte that is neither `,` nor `;` appeared where a terminator was expected.
    InvalidTerminator(u8),
    /// The bytes collected for an element were not valid UTF-8.
    InvalidUtf8,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLength => write!(f, "element is missing its codepoint-count prefix"),
            Self::InvalidLength(b) => write!(f, "unexpected byte {b:#04x} in length prefix"),
            Self::InvalidTerminator(b) => {
                write!(f, "unexpected byte {b:#04x}, expected ',' or ';'")
            }
            Self::InvalidUtf8 => write!(f, "element bytes are not valid UTF-8"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Failure produced while reading a complete instruction off a transport.
#[derive(Debug)]
pub enum ReadError {
    /// No bytes arrived before the read deadline elapsed.
    Timeout,
    /// The peer closed the connection.
    ///
    /// `mid_instruction` distinguishes a clean EOF between instructions from
    /// one that truncated an instruction in progress.
    Closed {
        /// Whether a partial instruction had already been started.
        mid_instruction: bool,
    },
    /// The instruction stream violated the wire grammar.
    Protocol(ParseError),
    /// The underlying transport returned an I/O error.
    Io(std::io::Error),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timed out waiting for an instruction"),
            Self::Closed { mid_instruction: true } => {
                write!(f, "connection closed mid-instruction")
            }
            Self::Closed { mid_instruction: false } => write!(f, "connection closed"),
            Self::Protocol(e) => write!(f, "protocol error: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Protocol(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Timeout | Self::Closed { .. } => None,
        }
    }
}

/// Failure produced while writing an instruction to a transport.
#[derive(Debug)]
pub enum WriteError {
    /// The underlying transport returned an I/O error.
    Io(std::io::Error),
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
        }
    }
}
