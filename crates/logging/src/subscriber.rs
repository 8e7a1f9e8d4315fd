//! Wires a `-L`-selected [`LogLevel`] into a process-wide `tracing`
//! subscriber.

use tracing_subscriber::EnvFilter;

use crate::level::LogLevel;

/// Installs a `tracing_subscriber::fmt` subscriber as the global default,
/// filtered at `level` unless the `RUST_LOG` environment variable is set
/// (which always wins, for ad hoc debugging without a restart).
///
/// Writes to stderr, matching the upstream daemon's convention of never
/// putting log output on the same stream a foreground-mode admin might be
/// piping protocol data through.
///
/// # Panics
///
/// Panics if a global subscriber has already been installed; this should
/// be called exactly once, from `main`.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_filter().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
