//! Tracing setup.
//!
//! A trimmed fmt subscriber: verbosity flags map to a default filter,
//! `LENSDESK_LOG` overrides it with a full EnvFilter directive.

use tracing_subscriber::EnvFilter;

pub fn is_test_env() -> bool {
    std::env::var_os("LENSDESK_TESTING").is_some()
        || std::env::var_os("RUST_TEST_THREADS").is_some()
}

fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "lensdesk=info",
        2 => "lensdesk=debug",
        _ => "lensdesk=trace",
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are no-ops.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env("LENSDESK_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
