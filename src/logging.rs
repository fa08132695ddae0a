//! Diagnostic logging.
//!
//! Reports go to stdout, so every log line is written to stderr. The default
//! level only surfaces warnings (for example unreadable log files); `--verbose`
//! turns on per-project and per-scan debug output. `RUST_LOG` overrides both.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Call once at startup.
pub fn init(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .without_time()
        .compact();

    // A subscriber may already be set (e.g. by a test harness)
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}

fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "warn" };
    format!("cc_usage={level}")
}
