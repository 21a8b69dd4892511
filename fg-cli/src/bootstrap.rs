use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::args::LogFormat;

/// Installs the global tracing subscriber, following the teacher's
/// `registry().with(EnvFilter...).with(fmt layer).init()` shape.
pub fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::from_default_env());

    match format {
        LogFormat::Plain => {
            tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .init();
        }
    }
}
