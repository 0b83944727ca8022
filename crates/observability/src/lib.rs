//! Process-wide log setup for the catalogue tools.

/// Subscriber configuration (filters, output format).
pub mod tracing;

/// Install JSON logging filtered by `RUST_LOG` (default `info`).
///
/// Safe to call multiple times; only the first call installs a subscriber.
pub fn init() {
    tracing::init(tracing::DEFAULT_FILTER);
}

/// Like [`init`] but writes through the test harness capture.
pub fn init_for_tests() {
    tracing::init_test(tracing::DEFAULT_FILTER);
}
