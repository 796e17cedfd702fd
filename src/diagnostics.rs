//! User-facing error text and log setup.
//!
//! stdout carries the generated playbook, so every diagnostic goes to stderr.

use std::fmt::Display;
use tracing_subscriber::EnvFilter;

const ERROR_PREFIX: &str = "error: ";

/// Prefix a failure message so every fatal error reads the same way.
pub fn error_message(msg: impl Display) -> String {
    let msg = msg.to_string();
    if msg.starts_with(ERROR_PREFIX) {
        msg
    } else {
        format!("{ERROR_PREFIX}{msg}")
    }
}

/// Install the stderr subscriber. `RUST_LOG` overrides the default `warn` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // try_init: a second call (tests) must not panic.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
