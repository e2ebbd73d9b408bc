use serde::Deserialize;
use serde_json::Value;

/// Forecast document as returned by the service
///
/// Entries are kept undecoded so that a malformed interval can be reported with its position.
#[derive(Deserialize, Debug, Default, PartialEq)]
pub struct RawPayload {
    #[serde(default)]
    pub list: Option<Vec<Value>>,
}

/// Error document returned alongside non-success statuses
#[derive(Deserialize, Debug)]
pub struct ErrorBody {
    pub message: Option<String>,
}

/// One forecast interval, only the fields the dashboard uses
#[derive(Deserialize, Debug)]
pub struct RawInterval {
    pub dt: i64,
    pub main: RawMain,
    pub wind: RawWind,
    pub weather: Vec<RawCondition>,
}

#[derive(Deserialize, Debug)]
pub struct RawMain {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: i64,
}

#[derive(Deserialize, Debug)]
pub struct RawWind {
    pub speed: f64,
}

#[derive(Deserialize, Debug)]
pub struct RawCondition {
    pub description: String,
}
