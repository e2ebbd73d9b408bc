use std::path::PathBuf;
use std::time::Duration;
use log::info;
use thiserror::Error;
use crate::config::Config;
use crate::initialization::RunParameters;
use crate::manager_dashboard::{RenderError, RenderRequest, render};
use crate::manager_forecast::{FetchError, ForecastClient, ForecastRequest};
use crate::retry;
use crate::shaping::{ShapeError, shape};

/// Runs one fetch, shape and render pass
///
/// Returns the path of the written dashboard, or None if the forecast held no intervals.
///
/// # Arguments
///
/// * 'config' - configuration
/// * 'params' - resolved run parameters
pub fn run(config: &Config, params: &RunParameters) -> Result<Option<PathBuf>, RunError> {
    let client = ForecastClient::new(&config.forecast.base_url, Duration::from_secs(config.forecast.timeout_secs))?;
    let request = ForecastRequest {
        city: &params.city,
        units: params.units,
        language: params.language.as_deref(),
        credential: &params.credential,
    };

    info!("fetching {} forecast for {}", params.units, params.city);
    let payload = retry!(&config.forecast.retry, || client.fetch(&request))?;

    let series = shape(payload)?;
    info!("shaped {} forecast intervals", series.len());

    let render_request = RenderRequest {
        city_label: &params.city,
        units: params.units,
        output: &params.output,
        show: params.show,
    };
    let written = render(&series, &render_request, &config.dashboard)?;

    Ok(written)
}

/// Error depicting errors that end a run
///
#[derive(Debug, Error)]
pub enum RunError {
    #[error("FetchError: {0}")]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    Shape(#[from] ShapeError),
    #[error("RenderError: {0}")]
    Render(#[from] RenderError),
}

impl RunError {
    /// Process exit code for the error kind
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Fetch(FetchError::Configuration(_)) => 1,
            RunError::Fetch(_) => 2,
            RunError::Shape(_) => 3,
            RunError::Render(_) => 4,
        }
    }
}
