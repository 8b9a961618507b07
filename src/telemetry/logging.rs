use std::path::Path;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const GAME_LOG: &str = "game.log";

/// Keeps the file writer flushing for the life of the process.
static GUARD: OnceLock<Option<WorkerGuard>> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset, e.g. `info` or `tundra=debug`.
    pub level: String,
    /// Directory for the daily `game.log`; console only when `None`.
    pub dir: Option<std::path::PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init(config: &LogConfig) -> Result<(), String> {
    if GUARD.get().is_some() {
        return Ok(());
    }
    let filter = env_filter(&config.level)?;
    let guard = match config.dir.as_deref() {
        Some(dir) => Some(init_with_file(filter, dir)?),
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(false))
                .try_init()
                .map_err(|err| format!("log subscriber init failed: {}", err))?;
            None
        }
    };
    let _ = GUARD.set(guard);
    Ok(())
}

fn init_with_file(filter: EnvFilter, dir: &Path) -> Result<WorkerGuard, String> {
    std::fs::create_dir_all(dir)
        .map_err(|err| format!("log directory create failed: {}", err))?;
    let appender = tracing_appender::rolling::daily(dir, GAME_LOG);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(|err| format!("log subscriber init failed: {}", err))?;
    tracing::info!(dir = %dir.display(), "logging to {}", GAME_LOG);
    Ok(guard)
}

fn env_filter(level: &str) -> Result<EnvFilter, String> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level)
            .map_err(|err| format!("invalid log level '{}': {}", level, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_level_is_reported() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(env_filter("tundra=loudest").is_err());
        assert!(env_filter("tundra=debug,warn").is_ok());
    }

    #[test]
    fn default_config_logs_to_console_at_info() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.dir.is_none());
    }
}
