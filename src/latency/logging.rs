use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize structured logging from `RUST_LOG`, defaulting to `info`
///
/// Examples:
/// - `RUST_LOG=debug` - Debug level and above
/// - `RUST_LOG=pktlat=debug` - Debug level for this crate only
///
/// Per-probe events are emitted at `debug`/`trace` and are compiled out unless
/// the `tracing` level features are relaxed.
pub fn init_logging() {
    init_logging_with_config("info", false);
}

/// Initialize logging with an explicit default level and output format
///
/// `RUST_LOG` still takes precedence over `level` when set.
pub fn init_logging_with_config(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_thread_ids(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true),
            )
            .init();
    }
}
