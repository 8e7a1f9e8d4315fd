//! The error taxonomy exposed on the wire via `error,<message>,<status>`.
//!
//! Variant names and groupings are taken directly from spec §7's table;
//! grounded on `examples/original_source/libguac/src/error.c`'s
//! `guac_status` enum for the base kinds (`Success`, `NoMemory`, `NoInput`,
//! `InputTimeout`, `OutputError`, `BadArgument`, `BadState`) and
//! supplemented with the framing/transport/plugin kinds spec §7 adds
//! (`Protocol`, `Closed`, `NotFound`, `Forbidden`, the `Upstream*` family).
//! `NotFound`'s wire value of `0x0200` is pinned directly by spec.md's own
//! end-to-end scenario 1 (`loader NotFound → ... 0x0200; disconnect;`); the
//! remaining numeric values fill out the same 0x0xxx-per-category shape
//! around that one fixed point, since no status-code table survived into
//! the retrieved source subset.

use std::fmt;

/// A status kind reported in an `error` instruction or recorded in a task's
/// error slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum GuacStatus {
    /// No error occurred.
    Success = 0x0000,
    /// Allocation failed.
    NoMemory = 0x0001,
    /// The peer cleanly closed the connection between instructions.
    NoInput = 0x0100,
    /// A read deadline elapsed waiting for bytes.
    InputTimeout = 0x0101,
    /// The underlying transport returned an I/O error.
    Io = 0x0102,
    /// A write to the rendering socket failed.
    OutputError = 0x0103,
    /// A handler or the handshake rejected its arguments.
    BadArgument = 0x0300,
    /// The operation is invalid in the client's current lifecycle state.
    BadState = 0x0301,
    /// Instruction framing or codepoint-count accounting was violated.
    Protocol = 0x0302,
    /// The handshake named a protocol with no registered plugin.
    NotFound = 0x0200,
    /// The remote end hung up.
    Closed = 0x0201,
    /// The upstream server actively refused the connection.
    Forbidden = 0x0203,
    /// The upstream server did not respond within its deadline.
    UpstreamTimeout = 0x0204,
    /// The upstream server reported an error.
    UpstreamError = 0x0205,
    /// The upstream protocol or resource named does not exist.
    UpstreamNotFound = 0x0206,
    /// The upstream server is temporarily unable to service the request.
    UpstreamUnavailable = 0x0207,
}

impl GuacStatus {
    /// The decimal string sent as the `error` instruction's status
    /// argument.
    #[must_use]
    pub fn wire(self) -> &'static str {
        match self {
            Self::Success => "0",
            Self::NoMemory => "1",
            Self::NoInput => "256",
            Self::InputTimeout => "257",
            Self::Io => "258",
            Self::OutputError => "259",
            Self::BadArgument => "768",
            Self::BadState => "769",
            Self::Protocol => "770",
            Self::NotFound => "512",
            Self::Closed => "513",
            Self::Forbidden => "515",
            Self::UpstreamTimeout => "516",
            Self::UpstreamError => "517",
            Self::UpstreamNotFound => "518",
            Self::UpstreamUnavailable => "519",
        }
    }

    /// A short, human-readable description, in the spirit of
    /// `guac_status_string` from the original C implementation.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::NoMemory => "Insufficient memory",
            Self::NoInput => "End of input stream",
            Self::InputTimeout => "Read timeout",
            Self::Io => "Transport I/O error",
            Self::OutputError => "Output error",
            Self::BadArgument => "Invalid argument",
            Self::BadState => "Illegal state",
            Self::Protocol => "Protocol violation",
            Self::NotFound => "Protocol not found",
            Self::Closed => "Connection closed",
            Self::Forbidden => "Upstream connection forbidden",
            Self::UpstreamTimeout => "Upstream timeout",
            Self::UpstreamError => "Upstream error",
            Self::UpstreamNotFound => "Upstream resource not found",
            Self::UpstreamUnavailable => "Upstream unavailable",
        }
    }
}

impl fmt::Display for GuacStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}
