//! Logging setup for the freightyard binary.
//!
//! Human-readable output goes to stdout; log lines go to stderr so that
//! `--json` output stays machine-readable. The filter defaults to `info` and
//! is overridable with `RUST_LOG`.

use std::io;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global subscriber. `verbose` lowers the default level to
/// `debug` when `RUST_LOG` is unset.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}
