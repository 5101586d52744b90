use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogConfig;

const DEFAULT_FILTER: &str = "standings_bot=info";

/// Log to stdout and, when the log directory is writable, to the log file.
/// `RUST_LOG` overrides the default filter.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let file = fs::create_dir_all(&config.dir)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(config.path()));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true));

    match file {
        Ok(file) => {
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .init();
        }
        Err(e) => {
            registry.init();
            tracing::warn!("Logging to stdout only, cannot open {:?}: {}", config.path(), e);
        }
    }
}
