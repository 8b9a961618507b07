use crate::telemetry::logging::LogConfig;
use std::path::PathBuf;
use std::time::Duration;

pub const USAGE: &str = "usage: tundra <scenario-name|scenario.yaml|list> [duration_s] [tick_ms] [seed]";

const DEFAULT_TICK_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{}", USAGE)]
    Usage,
    #[error("invalid {name} '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Run(ScenarioSource),
}

/// Where a scenario comes from: one of the embedded ones or a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioSource {
    Builtin(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub command: Command,
    /// Overrides the scenario's own duration.
    pub duration: Option<Duration>,
    /// Overrides the scenario's own tick length.
    pub tick: Option<Duration>,
    /// Overrides the scenario's own seed.
    pub seed: Option<u64>,
    pub log: LogConfig,
}

impl AppConfig {
    pub fn from_args(args: &[String]) -> Result<Self, ConfigError> {
        Self::from_args_with_env(args, |name| std::env::var(name).ok())
    }

    /// Positional arguments win; `TUNDRA_*` variables fill the gaps.
    pub fn from_args_with_env<F>(args: &[String], env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(target) = args.get(1) else {
            return Err(ConfigError::Usage);
        };
        let command = if target == "list" {
            Command::List
        } else if target.ends_with(".yaml") || target.ends_with(".yml") {
            Command::Run(ScenarioSource::File(PathBuf::from(target)))
        } else {
            Command::Run(ScenarioSource::Builtin(target.clone()))
        };

        let env_value = |name: &str| {
            env(name).and_then(|value| {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
        };

        let duration = match args.get(2) {
            Some(value) => Some(Duration::from_secs(parse_positive("duration_s", value)?)),
            None => None,
        };
        let tick = match args.get(3).cloned().or_else(|| env_value("TUNDRA_TICK_MS")) {
            Some(value) => Some(Duration::from_millis(parse_positive("tick_ms", &value)?)),
            None => None,
        };
        let seed = match args.get(4).cloned().or_else(|| env_value("TUNDRA_SEED")) {
            Some(value) => Some(parse_number("seed", &value)?),
            None => None,
        };
        if args.len() > 5 {
            return Err(ConfigError::Usage);
        }

        let log = LogConfig {
            level: env_value("TUNDRA_LOG").unwrap_or_else(|| "info".to_string()),
            dir: env_value("TUNDRA_LOG_DIR").map(PathBuf::from),
        };

        Ok(Self {
            command,
            duration,
            tick,
            seed,
            log,
        })
    }

    pub fn tick_or_default(&self, scenario_tick_ms: Option<u64>) -> Duration {
        self.tick
            .or_else(|| scenario_tick_ms.map(Duration::from_millis))
            .unwrap_or(Duration::from_millis(DEFAULT_TICK_MS))
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        })
}

fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match parse_number(name, value)? {
        0 => Err(ConfigError::Zero { name }),
        parsed => Ok(parsed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        std::iter::once("tundra")
            .chain(values.iter().copied())
            .map(str::to_string)
            .collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn missing_scenario_is_a_usage_error() {
        assert_eq!(
            AppConfig::from_args_with_env(&args(&[]), no_env),
            Err(ConfigError::Usage)
        );
    }

    #[test]
    fn positional_arguments() {
        let config = AppConfig::from_args_with_env(&args(&["last-rites", "180", "50", "9"]), no_env)
            .expect("config");
        assert_eq!(
            config.command,
            Command::Run(ScenarioSource::Builtin("last-rites".to_string()))
        );
        assert_eq!(config.duration, Some(Duration::from_secs(180)));
        assert_eq!(config.tick, Some(Duration::from_millis(50)));
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.log, LogConfig::default());
    }

    #[test]
    fn yaml_paths_are_files() {
        let config = AppConfig::from_args_with_env(&args(&["demos/trap.yaml"]), no_env).expect("config");
        assert_eq!(
            config.command,
            Command::Run(ScenarioSource::File(PathBuf::from("demos/trap.yaml")))
        );
        assert_eq!(config.tick_or_default(None), Duration::from_millis(DEFAULT_TICK_MS));
        assert_eq!(config.tick_or_default(Some(250)), Duration::from_millis(250));
    }

    #[test]
    fn environment_fills_the_gaps() {
        let env = |name: &str| match name {
            "TUNDRA_TICK_MS" => Some(" 20 ".to_string()),
            "TUNDRA_SEED" => Some("77".to_string()),
            "TUNDRA_LOG" => Some("tundra=debug".to_string()),
            "TUNDRA_LOG_DIR" => Some("".to_string()),
            _ => None,
        };
        let config = AppConfig::from_args_with_env(&args(&["list"]), env).expect("config");
        assert_eq!(config.command, Command::List);
        assert_eq!(config.tick, Some(Duration::from_millis(20)));
        assert_eq!(config.seed, Some(77));
        assert_eq!(config.log.level, "tundra=debug");
        assert_eq!(config.log.dir, None);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert_eq!(
            AppConfig::from_args_with_env(&args(&["caribou-trap", "soon"]), no_env),
            Err(ConfigError::InvalidNumber {
                name: "duration_s",
                value: "soon".to_string(),
            })
        );
        assert_eq!(
            AppConfig::from_args_with_env(&args(&["caribou-trap", "10", "0"]), no_env),
            Err(ConfigError::Zero { name: "tick_ms" })
        );
    }
}
