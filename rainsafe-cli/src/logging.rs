use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(level: &str, verbose: bool) {
    let default = if verbose { "debug" } else { level };

    // Target prefix match covers both the `rainsafe` binary and `rainsafe_core`.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,rainsafe={default}")));

    // Already installed is fine.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
