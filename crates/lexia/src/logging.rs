//! Diagnostic tracing for the CLI.
//!
//! Events go to stderr so they never mix with command output on stdout.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn";

/// Installs the global subscriber.
///
/// Reads `RUST_LOG`, falling back to `warn`; `verbose` raises the lexia
/// crates to `debug`. Calling it twice is harmless.
///
/// ```bash
/// RUST_LOG=lexia_validate=trace lexia validate radicado 11001
/// ```
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("warn,lexia=debug,lexia_seeker=debug,lexia_table=debug,lexia_validate=debug")
        } else {
            EnvFilter::new(DEFAULT_FILTER)
        }
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
