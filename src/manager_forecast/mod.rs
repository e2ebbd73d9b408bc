pub mod models;

use std::time::Duration;
use log::debug;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use thiserror::Error;
use crate::errors::ConfigurationError;
use crate::macros::Retryable;
use crate::manager_forecast::models::{ErrorBody, RawPayload};
use crate::models::Units;

/// Credential values shipped in sample configurations, never valid keys
const PLACEHOLDER_CREDENTIALS: [&str; 2] = ["YOUR_API_KEY", "<API_KEY>"];

/// Parameters for one forecast request
#[derive(Debug, Clone)]
pub struct ForecastRequest<'a> {
    pub city: &'a str,
    pub units: Units,
    pub language: Option<&'a str>,
    pub credential: &'a str,
}

/// Client for the 5 day / 3 hour forecast endpoint
///
/// Holds nothing but the HTTP client and the endpoint, every request carries its own parameters.
pub struct ForecastClient {
    client: Client,
    base_url: String,
}

impl ForecastClient {
    /// Returns a client ready for fetching forecasts
    ///
    /// # Arguments
    ///
    /// * 'base_url' - service base url, i.e. without the trailing `/forecast`
    /// * 'timeout' - timeout for each HTTP request
    pub fn new(base_url: &str, timeout: Duration) -> Result<ForecastClient, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::NetworkError(e.without_url().to_string()))?;

        Ok(ForecastClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Retrieves the raw forecast document for a city
    ///
    /// Exactly one request is made, and only if the request parameters are valid.
    ///
    /// # Arguments
    ///
    /// * 'request' - city, units, optional language and the API key to use
    pub fn fetch(&self, request: &ForecastRequest) -> Result<RawPayload, FetchError> {
        validate_request(request)?;

        let url = format!("{}/forecast", self.base_url);
        let mut query = vec![
            ("q", request.city.trim()),
            ("appid", request.credential.trim()),
            ("units", request.units.as_query()),
        ];
        if let Some(lang) = request.language.filter(|l| !l.trim().is_empty()) {
            query.push(("lang", lang.trim()));
        }

        debug!("requesting forecast for '{}' in {} units", request.city.trim(), request.units);
        let response = self.client
            .get(url)
            .query(&query)
            .send()
            .map_err(|e| FetchError::NetworkError(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| FetchError::NetworkError(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(classify_status(status, request.city.trim(), &body));
        }

        let payload: RawPayload = serde_json::from_str(&body)
            .map_err(|e| FetchError::Document(e.to_string()))?;
        debug!("received {} forecast intervals", payload.list.as_ref().map_or(0, Vec::len));

        Ok(payload)
    }
}

/// Checks request parameters that would make a network call pointless
///
/// # Arguments
///
/// * 'request' - the request to check
pub fn validate_request(request: &ForecastRequest) -> Result<(), ConfigurationError> {
    if request.city.trim().is_empty() {
        return Err(ConfigurationError::EmptyCity);
    }
    validate_credential(request.credential)
}

/// Checks that a credential is present and not a known placeholder
///
/// # Arguments
///
/// * 'credential' - the API key to check
pub fn validate_credential(credential: &str) -> Result<(), ConfigurationError> {
    let credential = credential.trim();
    if credential.is_empty() {
        return Err(ConfigurationError::MissingCredential);
    }
    if PLACEHOLDER_CREDENTIALS.iter().any(|p| p.eq_ignore_ascii_case(credential)) {
        return Err(ConfigurationError::PlaceholderCredential);
    }

    Ok(())
}

/// Maps a non-success status to its error kind
///
/// # Arguments
///
/// * 'status' - HTTP status of the response
/// * 'city' - the requested city, for the not found message
/// * 'body' - response body, which may carry a service message
fn classify_status(status: StatusCode, city: &str, body: &str) -> FetchError {
    match status {
        StatusCode::NOT_FOUND => FetchError::NotFound(city.to_string()),
        StatusCode::UNAUTHORIZED => FetchError::Unauthorized,
        _ => {
            let message = serde_json::from_str::<ErrorBody>(body)
                .ok()
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown status").to_string());

            FetchError::HttpError { status: status.as_u16(), message }
        }
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("ConfigurationError: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("city '{0}' not found, please check the spelling and try again")]
    NotFound(String),
    #[error("invalid API key, please check your OpenWeatherMap API key")]
    Unauthorized,
    #[error("{}", http_error_message(.status, .message))]
    HttpError { status: u16, message: String },
    #[error("NetworkError: {0}")]
    NetworkError(String),
    #[error("DocumentError: {0}")]
    Document(String),
}

fn http_error_message(status: &u16, message: &str) -> String {
    if *status == 429 {
        format!("rate limit exceeded (HTTP 429), please wait and try again: {}", message)
    } else {
        format!("HTTP error {}: {}", status, message)
    }
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::NetworkError(_) => true,
            FetchError::HttpError { status, .. } => matches!(*status, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}
