//! Tracing setup for the command-line tool.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable holding an `EnvFilter` directive, e.g.
/// `SHELLDEPS_LOG=shelldeps::resolve=debug`.
pub const LOG_ENV: &str = "SHELLDEPS_LOG";

static INIT: Once = Once::new();

/// Install the global subscriber, writing to stderr.
///
/// `SHELLDEPS_LOG` wins over `verbose`. Later calls are no-ops.
pub fn init_tracing(verbose: bool) {
    INIT.call_once(|| {
        let default = if verbose { "shelldeps=debug" } else { "shelldeps=warn" };
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(verbose),
            )
            .with(filter)
            .try_init();
    });
}
