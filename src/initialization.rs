use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use argh::FromArgs;
use log::{LevelFilter, debug, info};
use thiserror::Error;
use crate::config::{Config, LoadConfigurationError, default_config_path, load_config};
use crate::errors::ConfigurationError;
use crate::logging::{LoggerError, setup_logger};
use crate::manager_dashboard::default_output_path;
use crate::manager_forecast::validate_credential;
use crate::models::Units;

pub const CITY_ENV: &str = "CITY";
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

#[derive(FromArgs, Debug, Default)]
/// 5-day/3-hour weather dashboard using OpenWeatherMap.
pub struct Args {
    /// city name (e.g. London), falls back to the CITY variable and then to a prompt
    #[argh(option, short = 'c')]
    pub city: Option<String>,

    /// unit system: metric, imperial or standard
    #[argh(option, short = 'u')]
    pub units: Option<Units>,

    /// path to save the generated image to
    #[argh(option, short = 'o')]
    pub output: Option<String>,

    /// do not open the image after saving it (useful on servers)
    #[argh(switch)]
    pub no_show: bool,

    /// log at debug level
    #[argh(switch, short = 'v')]
    pub verbose: bool,

    /// language code for the weather descriptions (e.g. de, fr)
    #[argh(option, short = 'l')]
    pub lang: Option<String>,

    /// the OpenWeatherMap API key, falls back to OPENWEATHER_API_KEY and then to the config file
    #[argh(option, short = 'k')]
    pub api_key: Option<String>,

    /// path to a TOML configuration file
    #[argh(option)]
    pub config: Option<String>,
}

/// Everything a run needs, resolved from arguments, environment and configuration
#[derive(Debug)]
pub struct RunParameters {
    pub city: String,
    pub units: Units,
    pub language: Option<String>,
    pub credential: String,
    pub output: PathBuf,
    pub show: bool,
}

/// Parses arguments, loads configuration, sets up logging and resolves the run parameters
///
pub fn init() -> Result<(Config, RunParameters), InitializationError> {
    let args: Args = argh::from_env();

    // Load configuration, the file is optional
    let config_path = args.config.as_ref().map(PathBuf::from).or_else(default_config_path);
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    // Setup logging
    let log_level = if args.verbose { LevelFilter::Debug } else { config.general.log_level };
    let _ = setup_logger(config.general.log_path.as_deref(), log_level, config.general.log_to_stdout)?;

    info!("starting weather dashboard version: {}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        debug!("configuration loaded from {}", path.display());
    }

    let params = resolve_parameters(
        &args,
        &config,
        env::var(CITY_ENV).ok(),
        env::var(API_KEY_ENV).ok(),
        prompt_city,
    )?;

    Ok((config, params))
}

/// Resolves the run parameters
///
/// # Arguments
///
/// * 'args' - command line arguments
/// * 'config' - loaded configuration
/// * 'city_env' - value of the CITY variable, if set
/// * 'api_key_env' - value of the OPENWEATHER_API_KEY variable, if set
/// * 'prompt' - asks the user for a city when no other source has one
pub fn resolve_parameters<F>(args: &Args, config: &Config, city_env: Option<String>, api_key_env: Option<String>, prompt: F) -> Result<RunParameters, ConfigurationError>
where
    F: FnOnce() -> io::Result<String>,
{
    let credential = resolve_credential(args.api_key.clone(), api_key_env, config.forecast.api_key.clone())?;
    let city = resolve_city(args.city.clone(), city_env, prompt)?;

    let output = match &args.output {
        Some(o) if !o.trim().is_empty() => PathBuf::from(o.trim()),
        _ => default_output_path(&city, config.dashboard.output_dir.as_deref()),
    };

    Ok(RunParameters {
        units: args.units.unwrap_or(config.forecast.units),
        language: args.lang.clone().or_else(|| config.forecast.language.clone()),
        show: !args.no_show,
        city,
        credential,
        output,
    })
}

/// Picks the first non-empty city from argument, environment and prompt, in that order
///
/// # Arguments
///
/// * 'arg' - city given on the command line
/// * 'env' - city from the environment
/// * 'prompt' - asks the user for a city
fn resolve_city<F>(arg: Option<String>, env: Option<String>, prompt: F) -> Result<String, ConfigurationError>
where
    F: FnOnce() -> io::Result<String>,
{
    let given = arg
        .into_iter()
        .chain(env)
        .map(|c| c.trim().to_string())
        .find(|c| !c.is_empty());

    let city = match given {
        Some(c) => c,
        None => prompt()
            .map_err(|e| ConfigurationError::Prompt(e.to_string()))?
            .trim()
            .to_string(),
    };

    if city.is_empty() {
        return Err(ConfigurationError::EmptyCity);
    }

    Ok(city)
}

/// Picks the first non-empty credential from argument, environment and configuration, in that order
///
/// # Arguments
///
/// * 'arg' - key given on the command line
/// * 'env' - key from the environment
/// * 'config' - key from the configuration file
fn resolve_credential(arg: Option<String>, env: Option<String>, config: Option<String>) -> Result<String, ConfigurationError> {
    let credential = arg
        .into_iter()
        .chain(env)
        .chain(config)
        .map(|k| k.trim().to_string())
        .find(|k| !k.is_empty())
        .ok_or(ConfigurationError::MissingCredential)?;

    validate_credential(&credential)?;

    Ok(credential)
}

/// Asks for a city on stdin
///
fn prompt_city() -> io::Result<String> {
    print!("Enter the city name to get the weather forecast: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;

    Ok(line)
}

/// Error depicting errors that occur while initializing a run
///
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("LoadConfigurationError: {0}")]
    LoadConfiguration(#[from] LoadConfigurationError),
    #[error("SetupLoggerError: {0}")]
    SetupLogger(#[from] LoggerError),
    #[error("ConfigurationError: {0}")]
    Configuration(#[from] ConfigurationError),
}
