//! Logging setup for the `codecursor` binaries.
//!
//! Logs go to stderr so they never mix with edited output on stdout.
//!
//! ## Environment Variables
//!
//! 1. **`CODECURSOR_LOG`** (highest priority)
//! 2. **`RUST_LOG`**
//! 3. **Default** - `warn`

use std::env;

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber. Safe to call more than once; later calls are no-ops.
pub fn init() {
    let _ = fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn filter() -> EnvFilter {
    let directives = env::var("CODECURSOR_LOG")
        .or_else(|_| env::var("RUST_LOG"))
        .unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
