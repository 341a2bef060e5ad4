//! Development helper for structured logging.

/// Initialize a tracing subscriber for bridge diagnostics.
///
/// Filters from `RUST_LOG` when set; otherwise enables the bridge's own
/// warnings (dropped messages, would-block sends, close protocol) so tests
/// and examples see misbehaving bundles without third-party noise. Thread
/// names are included in the output because the interesting question is
/// usually which worker (`<name>-socket` or `<name>-chan`) logged the event.
/// No-op when a global subscriber is already installed.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trestle=warn,trestle_core=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init();
}
