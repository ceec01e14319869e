//! Tracing setup shared by `pir-pub` and `pir-sub`.
//!
//! `RUST_LOG` wins when it is set and parses; otherwise the `--log-level`
//! value applies to every target.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

/// Maps a `--log-level` value to a level; anything unrecognised is `INFO`.
pub fn parse_level(name: &str) -> Level {
    match name.trim().to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" | "warning" => Level::WARN,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    }
}

pub fn init(fallback_level: &str) {
    let level = parse_level(fallback_level);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    // try_init: tests call this repeatedly
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
