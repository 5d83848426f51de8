//! Tracing setup for the CLI.
//!
//! The filter comes from `FIELDSCOPE_LOG`, falling back to `RUST_LOG`, and
//! defaults to `warn` so skipped class files are always visible. Output goes
//! to stderr; stdout carries only command results.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "FIELDSCOPE_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Build an `EnvFilter` from `FIELDSCOPE_LOG`, then `RUST_LOG`, then the default.
pub fn build_filter() -> EnvFilter {
    match std::env::var(LOG_ENV).or_else(|_| std::env::var("RUST_LOG")) {
        Ok(value) if !value.trim().is_empty() => EnvFilter::builder().parse_lossy(value),
        _ => EnvFilter::new(DEFAULT_FILTER),
    }
}

/// Install the global subscriber. Calling it twice is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
