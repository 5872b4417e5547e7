//! Tracing subscriber setup.
//!
//! Library crates only emit events; installing a subscriber is left to the
//! binary embedding the engine, through [`init_tracing`].

use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`. Returns `false` when a
/// subscriber was already installed, which leaves the existing one active.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let subscriber = tracing_subscriber::registry().with(env_filter(config));

    let installed = match (config.json, config.timestamps) {
        (true, true) => subscriber
            .with(fmt::layer().json().with_target(true))
            .try_init(),
        (true, false) => subscriber
            .with(fmt::layer().json().with_target(true).without_time())
            .try_init(),
        (false, true) => subscriber.with(fmt::layer().with_target(true)).try_init(),
        (false, false) => subscriber
            .with(fmt::layer().with_target(true).without_time())
            .try_init(),
    };
    installed.is_ok()
}
