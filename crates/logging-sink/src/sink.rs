//! The [`Sink`] trait and its stderr/syslog-style implementations.

use std::io::Write;
use std::sync::Mutex;

use logging::LogLevel;

use crate::record::Record;

/// Something a [`Record`] can be delivered to.
///
/// A real syslog adapter (forwarding to `syslogd`/`journald` over its native
/// protocol) is an external-collaborator concern this crate only needs an
/// interface point for; [`SyslogStyleSink`] formats lines in the
/// conventional syslog layout but writes them to a plain [`Write`], not a
/// live syslog socket.
pub trait Sink: Send + Sync {
    /// Delivers `record`.
    fn log(&self, record: &Record);
}

/// Writes `[LEVEL] message` lines to stderr.
pub struct StderrSink;

impl Sink for StderrSink {
    fn log(&self, record: &Record) {
        eprintln!("[{}] {}", record.level, record.message);
    }
}

/// Formats records as `<facility.level>guacd[pid]: message`, the
/// conventional syslog line shape, and writes them to the wrapped `Write`.
///
/// Thread-safe: writes are serialized through an internal mutex so
/// concurrent connections logging at once don't interleave partial lines.
pub struct SyslogStyleSink<W> {
    writer: Mutex<W>,
    pid: u32,
}

impl<W: Write> SyslogStyleSink<W> {
    /// Wraps `writer`, tagging every line with the current process id.
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer), pid: std::process::id() }
    }
}

impl<W: Write + Send> Sink for SyslogStyleSink<W> {
    fn log(&self, record: &Record) {
        let priority = syslog_priority(record.level);
        let mut writer = self.writer.lock().unwrap();
        let _ = writeln!(writer, "<{priority}>guacd[{}]: {}", self.pid, record.message);
    }
}

/// Maps a [`LogLevel`] to a syslog `daemon`-facility priority value
/// (`facility * 8 + severity`, facility 3 == `LOG_DAEMON`).
fn syslog_priority(level: LogLevel) -> u8 {
    const FACILITY_DAEMON: u8 = 3 * 8;
    let severity = match level {
        LogLevel::Error => 3,
        LogLevel::Warning => 4,
        LogLevel::Info => 6,
        LogLevel::Debug | LogLevel::Trace => 7,
    };
    FACILITY_DAEMON + severity
}
