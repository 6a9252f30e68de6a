use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{Result, SerieslyError};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise `component` logs at INFO.
/// `json` switches the output to one JSON object per line.
pub fn init_logger(component: &str, json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{}={},tower_http={}", component, Level::INFO, Level::INFO))
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if json {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_thread_names(true)
            .with_level(true)
            .with_ansi(true)
            .compact();
        registry.with(fmt_layer).try_init()
    };

    result.map_err(|e| SerieslyError::Internal(format!("Failed to initialize logger: {}", e)))
}
