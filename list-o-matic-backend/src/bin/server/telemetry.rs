use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, Layer as _};

const DEFAULT_LOG_LEVEL: &str =
    "info,list_o_matic_backend=debug,list_o_matic_database=debug,hyper=info,hyper_util=info";

/// Logs to stdout, `RUST_LOG` overrides [`DEFAULT_LOG_LEVEL`].
pub fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(
            stdout_log.with_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_LEVEL.into()),
            ),
        )
        .init();
}
