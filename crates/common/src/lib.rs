//! Shared infrastructure: environment selection, retry backoff and logging setup.

mod backoff;
mod environment;

pub use backoff::ExponentialBackoff;
pub use environment::{ApiHost, BinanceEnvironment, ParseEnvironmentError};

use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber.
///
/// Honors `RUST_LOG` (e.g. `RUST_LOG=binance_rest=debug`), defaulting to `info`.
/// Calling it twice is harmless; the second installation is ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
