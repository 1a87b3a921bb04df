use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a `tracing` subscriber printing to stdout.
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `BLOCKPORT_LOG_LEVEL`. Returns `false` when a global subscriber was
/// already installed.
pub fn init() -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "{}={}",
                    env!("CARGO_CRATE_NAME"),
                    blockport_config::CONFIG.log_level.to_lowercase()
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
