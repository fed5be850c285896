use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,aliaszip=debug,aliaszip_core=debug"
    } else {
        "warn"
    }
}

/// Initialize structured logging to stderr.
///
/// `RUST_LOG` takes precedence; otherwise only warnings are shown, or crate
/// debug output with `verbose`. Calling this twice is harmless: the second
/// subscriber is rejected and the first stays active.
pub fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
