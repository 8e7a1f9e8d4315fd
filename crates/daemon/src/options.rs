//! `-l`/`-b`/`-p`/`-f`/`-L` command-line parsing.

use std::fmt;
use std::path::PathBuf;

use clap::Parser;

use logging::{LogLevel, ParseLogLevelError};

/// The default listening port, matching the upstream daemon's `4822`.
pub const DEFAULT_PORT: u16 = 4822;

/// The default bind address: all interfaces.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

#[derive(Debug, Parser)]
#[command(name = "guacd", version, about = "Guacamole proxy daemon")]
struct Args {
    /// TCP port to listen on.
    #[arg(short = 'l', long = "listen", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind the listening socket to.
    #[arg(short = 'b', long = "bind-host", default_value = DEFAULT_BIND_HOST)]
    bind_host: String,

    /// Write the daemon's process id to this file.
    #[arg(short = 'p', long = "pid-file")]
    pid_file: Option<PathBuf>,

    /// Stay attached to the controlling terminal instead of forking.
    #[arg(short = 'f', long = "foreground")]
    foreground: bool,

    /// Minimum severity to log: error, warning, info, debug, or trace.
    #[arg(short = 'L', long = "log-level", default_value = "info")]
    log_level: String,
}

/// Validated startup configuration for `guacd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Address the listening socket binds to.
    pub bind_host: String,
    /// TCP port the listening socket binds to.
    pub port: u16,
    /// Where to write the daemon's pid once it has forked into the
    /// background, if anywhere.
    pub pid_file: Option<PathBuf>,
    /// Whether to skip forking into the background.
    pub foreground: bool,
    /// Minimum log severity to emit.
    pub log_level: LogLevel,
}

/// A `guacd` invocation could not be parsed into [`RuntimeOptions`].
#[derive(Debug)]
pub enum ArgsError {
    /// `clap` rejected the argument vector (including `--help`/`--version`,
    /// which clap reports as an "error" carrying the text to print).
    Clap(clap::Error),
    /// `-L` was given a value that is not a recognized log level name.
    LogLevel(ParseLogLevelError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clap(e) => write!(f, "{e}"),
            Self::LogLevel(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ArgsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Clap(e) => Some(e),
            Self::LogLevel(e) => Some(e),
        }
    }
}

impl From<clap::Error> for ArgsError {
    fn from(value: clap::Error) -> Self {
        Self::Clap(value)
    }
}

/// Whether `error` came from `--help`/`--version` rather than a genuine
/// usage mistake, i.e. whether `error.exit_code()` is `0`.
#[must_use]
pub fn is_display_request(error: &ArgsError) -> bool {
    matches!(error, ArgsError::Clap(e) if e.exit_code() == 0)
}

/// Parses `argv` (including the program name at index 0) into
/// [`RuntimeOptions`].
///
/// # Errors
///
/// Returns [`ArgsError`] if an argument is malformed, or if `argv` requested
/// `--help`/`--version` (see [`is_display_request`] to tell the two apart;
/// in both cases `error.to_string()` is the text to print).
pub fn from_args<I, T>(argv: I) -> Result<RuntimeOptions, ArgsError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let args = Args::try_parse_from(argv)?;
    let log_level = args.log_level.parse::<LogLevel>().map_err(ArgsError::LogLevel)?;

    Ok(RuntimeOptions {
        bind_host: args.bind_host,
        port: args.port,
        pid_file: args.pid_file,
        foreground: args.foreground,
        log_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_upstream_daemon() {
        let options = from_args(["guacd"]).unwrap();
        assert_eq!(options.port, DEFAULT_PORT);
        assert_eq!(options.bind_host, DEFAULT_BIND_HOST);
        assert_eq!(options.pid_file, None);
        assert!(!options.foreground);
        assert_eq!(options.log_level, LogLevel::Info);
    }

    #[test]
    fn parses_every_flag() {
        let options = from_args([
            "guacd", "-l", "5822", "-b", "127.0.0.1", "-p", "/run/guacd.pid", "-f", "-L", "debug",
        ])
        .unwrap();
        assert_eq!(options.port, 5822);
        assert_eq!(options.bind_host, "127.0.0.1");
        assert_eq!(options.pid_file, Some(PathBuf::from("/run/guacd.pid")));
        assert!(options.foreground);
        assert_eq!(options.log_level, LogLevel::Debug);
    }

    #[test]
    fn rejects_an_unrecognized_log_level() {
        let error = from_args(["guacd", "-L", "verbose"]).unwrap_err();
        assert!(matches!(error, ArgsError::LogLevel(_)));
    }

    #[test]
    fn rejects_a_non_numeric_port() {
        let error = from_args(["guacd", "-l", "not-a-port"]).unwrap_err();
        assert!(matches!(error, ArgsError::Clap(_)));
        assert!(!is_display_request(&error));
    }

    #[test]
    fn version_flag_is_a_display_request_not_a_usage_error() {
        let error = from_args(["guacd", "--version"]).unwrap_err();
        assert!(is_display_request(&error));
    }
}
