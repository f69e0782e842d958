#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Tracing bootstrap for meridian binaries and tests.

use tracing_subscriber::EnvFilter;

/// Initializes a stdout subscriber honoring `RUST_LOG`.
///
/// # Panics
///
/// Panics if a global subscriber is already installed.
pub fn init() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
}

/// Initializes tracing for a test.
///
/// Writes through the test capture and tolerates a subscriber installed by
/// an earlier test in the same process.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
