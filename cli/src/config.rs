//! Process environment and logging setup.
//!
//! This is the only place the binary reads environment variables; the values
//! are handed to the core explicitly.

use tracing_subscriber::EnvFilter;

/// Base URL of a self-hosted Shhh server.
pub const SERVER_ENV: &str = "SHHH_SERVER";
/// Log filter; `RUST_LOG` is consulted when unset.
pub const LOG_ENV: &str = "SHHH_LOG";

pub fn env_server() -> Option<String> {
    std::env::var(SERVER_ENV).ok()
}

pub fn init_tracing(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
