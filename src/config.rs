use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use log::LevelFilter;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use crate::models::Units;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct General {
    pub log_path: Option<String>,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

impl Default for General {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: LevelFilter::Info,
            log_to_stdout: true,
        }
    }
}

/// Bounded exponential backoff with jitter
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 8_000,
            jitter_factor: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Returns the time to wait before the retry following the given attempt (0-indexed)
    ///
    /// # Arguments
    ///
    /// * 'attempt' - number of attempts already failed, minus one
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay_ms as f64 * 2f64.powi(attempt.min(30) as i32);
        let capped = base.min(self.max_delay_ms as f64);

        let jitter_range = capped * self.jitter_factor.clamp(0.0, 1.0);
        let jitter = if jitter_range > 0.0 {
            rand::rng().random_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };

        Duration::from_millis((capped + jitter).max(0.0) as u64)
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Forecast {
    pub base_url: String,
    pub api_key: Option<String>,
    pub units: Units,
    pub language: Option<String>,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for Forecast {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            units: Units::default(),
            language: None,
            timeout_secs: 10,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Dashboard {
    pub width: u32,
    pub height: u32,
    pub output_dir: Option<String>,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            width: 2000,
            height: 1400,
            output_dir: None,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub general: General,
    pub forecast: Forecast,
    pub dashboard: Dashboard,
}

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &Path) -> Result<Config, LoadConfigurationError> {
    let toml = fs::read_to_string(config_path)
        .map_err(|e| LoadConfigurationError::Read(config_path.display().to_string(), e))?;
    let config: Config = toml::from_str(&toml)?;

    Ok(config)
}

/// Returns the default configuration file location, if one exists on this machine
///
pub fn default_config_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("weather_dashboard").join("config.toml");

    path.is_file().then_some(path)
}

/// Error depicting errors that occur while loading the configuration file
///
#[derive(Debug, Error)]
pub enum LoadConfigurationError {
    #[error("ReadError: {0}: {1}")]
    Read(String, #[source] std::io::Error),
    #[error("ParseError: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.forecast.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.forecast.units, Units::Metric);
        assert_eq!(config.forecast.retry.max_retries, 3);
        assert_eq!(config.general.log_level, LevelFilter::Info);
        assert_eq!(config.dashboard.width, 2000);
        assert!(config.forecast.api_key.is_none());
    }

    #[test]
    fn partial_file_overrides() {
        let toml = r#"
            [general]
            log_level = "Debug"

            [forecast]
            api_key = "abc123"
            units = "imperial"
            language = "de"

            [forecast.retry]
            max_retries = 1
        "#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.general.log_level, LevelFilter::Debug);
        assert_eq!(config.forecast.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.forecast.units, Units::Imperial);
        assert_eq!(config.forecast.language.as_deref(), Some("de"));
        assert_eq!(config.forecast.retry.max_retries, 1);
        assert_eq!(config.forecast.retry.initial_delay_ms, 500);
    }

    #[test]
    fn delay_is_capped_and_jittered_within_bounds() {
        let policy = RetryPolicy { max_retries: 5, initial_delay_ms: 100, max_delay_ms: 1_000, jitter_factor: 0.1 };

        for _ in 0..50 {
            let first = policy.delay_for_attempt(0).as_millis();
            assert!((90..=110).contains(&first), "first delay {}", first);

            let late = policy.delay_for_attempt(10).as_millis();
            assert!((900..=1_100).contains(&late), "late delay {}", late);
        }
    }

    #[test]
    fn delay_without_jitter_is_exact() {
        let policy = RetryPolicy { max_retries: 3, initial_delay_ms: 200, max_delay_ms: 10_000, jitter_factor: 0.0 };

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(800));
    }
}
