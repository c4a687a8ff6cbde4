use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn default_directives(verbose: bool) -> &'static str {
    if verbose { "warn,pivotfx=debug" } else { "warn" }
}

/// Installs the global subscriber. `RUST_LOG` replaces the defaults when set.
pub fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time())
        .with(env_filter)
        .init();
}
