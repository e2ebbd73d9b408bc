use thiserror::Error;

/// Error depicting bad or missing settings, detected before any network call is made
///
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("city name cannot be empty")]
    EmptyCity,
    #[error("missing OpenWeatherMap API key, provide --api-key, OPENWEATHER_API_KEY or forecast.api_key")]
    MissingCredential,
    #[error("the OpenWeatherMap API key is a placeholder value")]
    PlaceholderCredential,
    #[error("could not read city from stdin: {0}")]
    Prompt(String),
}
