use chrono::{DateTime, Local};
use thiserror::Error;
use crate::manager_forecast::models::{RawInterval, RawPayload};
use crate::models::{ForecastPoint, ForecastSeries};

/// Shapes the raw forecast document into a flat series
///
/// Entries keep the order of the document. An absent or empty list gives an empty series,
/// while the first malformed entry fails the whole series since a partial dashboard would
/// be misleading.
///
/// # Arguments
///
/// * 'payload' - forecast document as fetched
pub fn shape(payload: RawPayload) -> Result<ForecastSeries, ShapeError> {
    let entries = payload.list.unwrap_or_default();

    let points = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let interval: RawInterval = serde_json::from_value(entry)
                .map_err(|e| ShapeError::new(index, e.to_string()))?;
            to_point(interval).map_err(|reason| ShapeError::new(index, reason))
        })
        .collect::<Result<Vec<ForecastPoint>, ShapeError>>()?;

    Ok(ForecastSeries::new(points))
}

/// Validates one decoded interval and converts it to a forecast point
///
/// # Arguments
///
/// * 'interval' - the decoded interval
fn to_point(interval: RawInterval) -> Result<ForecastPoint, String> {
    let timestamp = DateTime::from_timestamp(interval.dt, 0)
        .ok_or(format!("timestamp {} out of range", interval.dt))?
        .with_timezone(&Local);

    let humidity = u8::try_from(interval.main.humidity)
        .ok()
        .filter(|h| *h <= 100)
        .ok_or(format!("humidity {} outside 0..=100", interval.main.humidity))?;

    let wind_speed = interval.wind.speed;
    if !wind_speed.is_finite() || wind_speed < 0.0 {
        return Err(format!("invalid wind speed {}", wind_speed));
    }

    let description = interval.weather
        .first()
        .map(|w| w.description.as_str())
        .ok_or("no weather condition".to_string())?;

    Ok(ForecastPoint {
        timestamp,
        temperature: interval.main.temp,
        feels_like: interval.main.feels_like,
        humidity,
        wind_speed,
        weather_label: title_case(description),
    })
}

/// Capitalizes the first letter of each word and lower cases the rest
///
/// Any character that isn't a letter starts a new word, e.g. "o'clock" becomes "O'Clock".
///
/// # Arguments
///
/// * 'text' - text to title case
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut word_start = true;

    for c in text.chars() {
        if c.is_alphabetic() {
            if word_start {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            result.push(c);
            word_start = true;
        }
    }

    result
}

/// Error depicting a malformed entry in the forecast document
///
#[derive(Debug, Error, PartialEq, Eq)]
#[error("ShapeError: forecast entry {index}: {reason}")]
pub struct ShapeError {
    pub index: usize,
    pub reason: String,
}

impl ShapeError {
    fn new(index: usize, reason: String) -> ShapeError {
        ShapeError { index, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn entry(dt: i64, temp: f64, humidity: i64, speed: f64, description: &str) -> Value {
        json!({
            "dt": dt,
            "main": {"temp": temp, "feels_like": temp - 1.0, "humidity": humidity, "pressure": 1012},
            "wind": {"speed": speed, "deg": 180},
            "weather": [{"id": 800, "main": "Clear", "description": description}],
            "dt_txt": "ignored"
        })
    }

    fn payload(list: Vec<Value>) -> RawPayload {
        RawPayload { list: Some(list) }
    }

    #[test]
    fn two_entry_scenario() {
        let first = json!({
            "dt": 1700000000,
            "main": {"temp": 15.0, "feels_like": 14.0, "humidity": 80},
            "wind": {"speed": 3.2},
            "weather": [{"description": "clear sky"}]
        });
        let second = json!({
            "dt": 1700010800,
            "main": {"temp": 16.0, "feels_like": 15.0, "humidity": 85},
            "wind": {"speed": 2.1},
            "weather": [{"description": "scattered clouds"}]
        });

        let series = shape(payload(vec![first, second])).unwrap();

        assert_eq!(series.len(), 2);
        let p0 = &series.points[0];
        assert_eq!(p0.timestamp.timestamp(), 1700000000);
        assert_eq!(p0.temperature, 15.0);
        assert_eq!(p0.feels_like, 14.0);
        assert_eq!(p0.humidity, 80);
        assert_eq!(p0.wind_speed, 3.2);
        assert_eq!(p0.weather_label, "Clear Sky");
        assert_eq!(series.points[1].humidity, 85);
        assert_eq!(series.points[1].temperature, 16.0);
    }

    #[test]
    fn order_is_kept_even_when_unsorted() {
        let list = vec![
            entry(1700021600, 10.0, 50, 1.0, "rain"),
            entry(1700000000, 11.0, 60, 2.0, "rain"),
            entry(1700010800, 12.0, 70, 3.0, "rain"),
            entry(1700010800, 12.0, 70, 3.0, "rain"),
        ];

        let series = shape(payload(list)).unwrap();

        let stamps: Vec<i64> = series.iter().map(|p| p.timestamp.timestamp()).collect();
        assert_eq!(stamps, vec![1700021600, 1700000000, 1700010800, 1700010800]);
    }

    #[test]
    fn absent_null_or_empty_list_is_empty_series() {
        assert!(shape(RawPayload { list: None }).unwrap().is_empty());
        assert!(shape(payload(Vec::new())).unwrap().is_empty());

        let null_list: RawPayload = serde_json::from_value(json!({"cod": "200", "list": null})).unwrap();
        assert!(shape(null_list).unwrap().is_empty());

        let no_list: RawPayload = serde_json::from_value(json!({"cod": "200"})).unwrap();
        assert!(shape(no_list).unwrap().is_empty());
    }

    #[test]
    fn points_stay_within_bounds() {
        let list = (0..40)
            .map(|i| entry(1700000000 + i * 10800, 5.0 + i as f64, i % 101, i as f64 * 0.5, "light rain"))
            .collect();

        let series = shape(payload(list)).unwrap();

        assert_eq!(series.len(), 40);
        assert!(series.iter().all(|p| p.humidity <= 100 && p.wind_speed >= 0.0));
    }

    #[test]
    fn missing_field_fails_whole_series() {
        let mut broken = entry(1700010800, 12.0, 70, 3.0, "rain");
        broken["main"].as_object_mut().unwrap().remove("feels_like");
        let list = vec![entry(1700000000, 11.0, 60, 2.0, "rain"), broken];

        let err = shape(payload(list)).unwrap_err();

        assert_eq!(err.index, 1);
        assert!(err.reason.contains("feels_like"), "reason: {}", err.reason);
    }

    #[test]
    fn empty_weather_array_is_malformed() {
        let mut broken = entry(1700000000, 11.0, 60, 2.0, "rain");
        broken["weather"] = json!([]);

        let err = shape(payload(vec![broken])).unwrap_err();

        assert_eq!(err, ShapeError::new(0, "no weather condition".to_string()));
    }

    #[test]
    fn out_of_range_values_are_malformed() {
        let humid = shape(payload(vec![entry(1700000000, 11.0, 120, 2.0, "mist")])).unwrap_err();
        assert!(humid.reason.contains("humidity"));

        let negative = shape(payload(vec![entry(1700000000, 11.0, -1, 2.0, "mist")])).unwrap_err();
        assert!(negative.reason.contains("humidity"));

        let wind = shape(payload(vec![entry(1700000000, 11.0, 50, -0.5, "mist")])).unwrap_err();
        assert!(wind.reason.contains("wind"));
    }

    #[test]
    fn non_object_entry_is_malformed() {
        let err = shape(payload(vec![json!("not an interval")])).unwrap_err();

        assert_eq!(err.index, 0);
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("light rain"), "Light Rain");
        assert_eq!(title_case("OVERCAST CLOUDS"), "Overcast Clouds");
        assert_eq!(title_case("thunderstorm with heavy drizzle"), "Thunderstorm With Heavy Drizzle");
        assert_eq!(title_case("sleet/snow"), "Sleet/Snow");
        assert_eq!(title_case("légère pluie"), "Légère Pluie");
        assert_eq!(title_case(""), "");
    }
}
