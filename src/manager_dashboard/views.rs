use std::ops::Range;
use chrono::{NaiveDateTime, TimeDelta};
use plotters::style::RGBColor;
use crate::models::ForecastSeries;

/// Tenths of a percent making up a whole
const WHOLE_TENTHS: u64 = 1000;

/// Stops of the sequential wind scale, lightness falls monotonically from calm to windy
const CALM: (f64, f64, f64) = (255.0, 237.0, 160.0);
const BREEZY: (f64, f64, f64) = (253.0, 141.0, 60.0);
const WINDY: (f64, f64, f64) = (189.0, 0.0, 38.0);

/// Qualitative palette for the weather label shares
const SHARE_PALETTE: [RGBColor; 10] = [
    RGBColor(158, 1, 66),
    RGBColor(213, 62, 79),
    RGBColor(244, 109, 67),
    RGBColor(253, 174, 97),
    RGBColor(254, 224, 139),
    RGBColor(230, 245, 152),
    RGBColor(171, 221, 164),
    RGBColor(102, 194, 165),
    RGBColor(50, 136, 189),
    RGBColor(94, 79, 162),
];

pub type TimeValue = (NaiveDateTime, f64);

/// Temperature and feels like over time
#[derive(Debug, PartialEq)]
pub struct TemperatureTrend {
    pub temperature: Vec<TimeValue>,
    pub feels_like: Vec<TimeValue>,
    pub time_range: Range<NaiveDateTime>,
    pub value_range: Range<f64>,
}

/// Humidity over time, on a fixed 0..100 axis
#[derive(Debug, PartialEq)]
pub struct HumidityTrend {
    pub humidity: Vec<TimeValue>,
    pub time_range: Range<NaiveDateTime>,
}

#[derive(Debug, PartialEq)]
pub struct WindBar {
    pub label: String,
    pub speed: f64,
    /// Position on the colour scale, 0.0 for the calmest interval and 1.0 for the windiest
    pub intensity: f64,
}

#[derive(Debug, PartialEq)]
pub struct WeatherShare {
    pub label: String,
    pub count: usize,
    pub tenths: u64,
}

impl WeatherShare {
    /// Share in percent with one decimal
    pub fn percent(&self) -> f64 {
        self.tenths as f64 / 10.0
    }
}

/// Returns the temperature trend view
///
/// # Arguments
///
/// * 'series' - a non-empty forecast series
pub fn temperature_trend(series: &ForecastSeries) -> TemperatureTrend {
    let temperature: Vec<TimeValue> = series.iter().map(|p| (p.timestamp.naive_local(), p.temperature)).collect();
    let feels_like: Vec<TimeValue> = series.iter().map(|p| (p.timestamp.naive_local(), p.feels_like)).collect();
    let value_range = padded_range(temperature.iter().chain(feels_like.iter()).map(|(_, v)| *v));

    TemperatureTrend {
        temperature,
        feels_like,
        time_range: time_range(series),
        value_range,
    }
}

/// Returns the humidity trend view
///
/// # Arguments
///
/// * 'series' - a non-empty forecast series
pub fn humidity_trend(series: &ForecastSeries) -> HumidityTrend {
    HumidityTrend {
        humidity: series.iter().map(|p| (p.timestamp.naive_local(), p.humidity as f64)).collect(),
        time_range: time_range(series),
    }
}

/// Returns one bar per interval in series order, each with its position on the colour scale
///
/// Speeds are normalized over the series minimum and maximum. If all speeds are equal every bar
/// sits in the middle of the scale.
///
/// # Arguments
///
/// * 'series' - forecast series
pub fn wind_bars(series: &ForecastSeries) -> Vec<WindBar> {
    let (min, max) = series.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), p| {
        (min.min(p.wind_speed), max.max(p.wind_speed))
    });
    let span = max - min;

    series
        .iter()
        .map(|p| WindBar {
            label: p.timestamp.format("%b-%d %Hh").to_string(),
            speed: p.wind_speed,
            intensity: if span > f64::EPSILON { (p.wind_speed - min) / span } else { 0.5 },
        })
        .collect()
}

/// Returns the share of intervals per distinct weather label
///
/// Shares are ordered by count, most frequent first, with ties kept in order of first appearance.
/// Percentages are given in tenths and always add up to exactly 100.0: every share gets its
/// rounded down value and the tenths left over go, one each, to the shares with the largest
/// remainders. Equal remainders are resolved in share order.
///
/// # Arguments
///
/// * 'series' - forecast series
pub fn weather_shares(series: &ForecastSeries) -> Vec<WeatherShare> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for p in series.iter() {
        match counts.iter_mut().find(|(label, _)| *label == p.weather_label) {
            Some((_, count)) => *count += 1,
            None => counts.push((p.weather_label.clone(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let total = series.len() as u64;
    if total == 0 {
        return Vec::new();
    }

    let mut shares: Vec<WeatherShare> = counts
        .into_iter()
        .map(|(label, count)| WeatherShare { label, count, tenths: count as u64 * WHOLE_TENTHS / total })
        .collect();

    let assigned: u64 = shares.iter().map(|s| s.tenths).sum();
    let mut by_remainder: Vec<usize> = (0..shares.len()).collect();
    by_remainder.sort_by(|a, b| {
        let ra = shares[*a].count as u64 * WHOLE_TENTHS % total;
        let rb = shares[*b].count as u64 * WHOLE_TENTHS % total;
        rb.cmp(&ra)
    });
    by_remainder
        .into_iter()
        .take((WHOLE_TENTHS - assigned) as usize)
        .for_each(|i| shares[i].tenths += 1);

    shares
}

/// Returns the colour for a position on the sequential wind scale
///
/// # Arguments
///
/// * 'intensity' - position on the scale, clamped to 0.0..=1.0
pub fn wind_color(intensity: f64) -> RGBColor {
    let t = if intensity.is_finite() { intensity.clamp(0.0, 1.0) } else { 0.5 };
    let (from, to, f) = if t < 0.5 { (CALM, BREEZY, t * 2.0) } else { (BREEZY, WINDY, (t - 0.5) * 2.0) };
    let mix = |a: f64, b: f64| (a + (b - a) * f).round() as u8;

    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

/// Returns the colour for the share at the given position
pub fn share_color(index: usize) -> RGBColor {
    SHARE_PALETTE[index % SHARE_PALETTE.len()]
}

/// Returns the time span of the series, widened to one interval if it covers a single point
fn time_range(series: &ForecastSeries) -> Range<NaiveDateTime> {
    let mut stamps = series.iter().map(|p| p.timestamp.naive_local());
    let first = stamps.next().unwrap_or_default();
    let (start, end) = stamps.fold((first, first), |(min, max), t| (min.min(t), max.max(t)));

    if start == end {
        start..end + TimeDelta::hours(3)
    } else {
        start..end
    }
}

/// Returns the value span widened by a tenth on each side, or by one unit if all values are equal
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| (min.min(v), max.max(v)));
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }

    let padding = if max - min > 1e-6 { (max - min) * 0.1 } else { 1.0 };
    (min - padding)..(max + padding)
}
