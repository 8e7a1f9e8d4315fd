#![deny(unsafe_code)]

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use daemon::options;
use logging_sink::StderrSink;

fn main() -> ExitCode {
    let options = match options::from_args(env::args_os()) {
        Ok(options) => options,
        Err(error) => {
            if options::is_display_request(&error) {
                println!("{error}");
                return ExitCode::SUCCESS;
            }
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(options.log_level);

    if let Some(pid_file) = &options.pid_file {
        if let Err(error) = daemon::write_pid_file(pid_file) {
            tracing::error!(path = %pid_file.display(), %error, "could not write pid file");
            return ExitCode::FAILURE;
        }
    }

    // Detaching from the controlling terminal is pid-file/daemonization
    // bookkeeping the core treats as an external collaborator's concern;
    // this binary always behaves as if `-f` were given.
    tracing::debug!(foreground = options.foreground, "starting guacd");

    let registry = Arc::new(guac_plugin::Registry::new());
    let sink: Arc<dyn logging_sink::Sink> = Arc::new(StderrSink);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("failed to start async runtime: {error}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(daemon::run(options, registry, sink)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
