//! A single log record handed to a [`crate::Sink`].

use logging::LogLevel;

/// One diagnostic message, already leveled and rendered to text.
///
/// Produced at the edge where `tracing` output would otherwise be the only
/// option, for the one case the daemon needs a record it can also hand to a
/// non-`tracing` destination (a syslog-style line writer, or a test sink
/// that just collects records for assertions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Severity of the message.
    pub level: LogLevel,
    /// The rendered message text.
    pub message: String,
}

impl Record {
    /// Builds a record at `level` with `message`.
    #[must_use]
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }
}
