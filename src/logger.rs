//! Diagnostic logging setup
//!
//! Diagnostics go to stderr through `tracing`, leaving stdout for the report.
//! `WLCONFIG_LOG` takes a full filter directive (`wlconfig=trace`,
//! `debug`, ...); without it `--verbose` picks between warnings and debug.

use crate::constants::LOG_ENV;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `WLCONFIG_LOG` is unset or invalid
pub fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "warn" };
    format!("wlconfig={},warn", level)
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    // Err only means a subscriber is already installed (tests, embedding)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(verbose))
        .try_init();
}
