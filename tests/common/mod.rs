//! Shared test utilities for snmp-acquire integration tests.

// Allow dead code and unused imports since not all test files use all utilities
#![allow(dead_code)]
#![allow(unused_imports)]

mod fixtures;
mod tools;

pub use fixtures::*;
pub use tools::*;

/// Route library logs to the test harness; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("snmp_acquire=debug")),
        )
        .with_test_writer()
        .try_init();
}
