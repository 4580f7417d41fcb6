use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Importer and API default when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,actix_server=warn";

/// Install the global fmt subscriber shared by both binaries.
///
/// `RUST_LOG` takes precedence over `default_filter`. Per-file importer
/// progress is logged at info, skipped snapshot entries at debug.
pub fn init_tracing(default_filter: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}
