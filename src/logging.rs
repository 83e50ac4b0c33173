use tracing_subscriber::EnvFilter;

/// Installs the global subscriber, writing to stderr so scripts on stdout stay clean.
///
/// `RUST_LOG` takes precedence; otherwise `verbose` selects `debug` and the default is `info`.
/// Calling it again is harmless.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
