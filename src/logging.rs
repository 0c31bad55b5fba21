//! Logging setup.
//!
//! Everything logs through `tracing` to stderr so stdout stays clean for
//! tables and JSON. Default level is `warn`; `--debug` raises it to `debug`,
//! and `RUST_LOG` wins over both when set.
//!
//! Field names used across the crate: `npp`, `notification_id`, `count`,
//! `unread`, `status`, `url` (never carries the token).

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

pub(crate) fn init(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pdam_notify={default_level}")));

    // A second init (e.g. from tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
