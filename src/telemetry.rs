//! Tracing and panic-report bootstrap for binaries, demos and benches.
//!
//! Logs go to **stderr**: stdout belongs to the NDJSON host protocol and
//! must stay machine-clean.

use tracing_error::ErrorLayer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber with the default filter
/// (`warn,breadboard=info`, overridable via `RUST_LOG`).
pub fn init() {
    init_with_filter("warn,breadboard=info");
}

/// Install the global subscriber with an explicit fallback filter.
/// Idempotent; later calls leave the first subscriber in place.
pub fn init_with_filter(default_filter: &str) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(ErrorLayer::default())
        .try_init()
        .ok();
}

/// Route panics through miette for readable reports.
pub fn init_panic_reporting() {
    miette::set_panic_hook();
}
