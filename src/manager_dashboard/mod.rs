pub mod views;

use std::env;
use std::path::{Path, PathBuf};
use chrono::NaiveDateTime;
use log::{info, warn};
use plotters::coord::Shift;
use plotters::coord::types::RangedDateTime;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::element::Pie;
use plotters::prelude::*;
use thiserror::Error;
use crate::config::Dashboard;
use crate::manager_dashboard::views::{HumidityTrend, TemperatureTrend, WeatherShare, WindBar};
use crate::models::{ForecastSeries, Units};
use crate::shaping::title_case;

const FONT: &str = "sans-serif";
const TITLE_COLOR: RGBColor = RGBColor(0, 0, 128);
const CRIMSON: RGBColor = RGBColor(220, 20, 60);
const ORANGE: RGBColor = RGBColor(255, 165, 0);
const DEEP_SKY_BLUE: RGBColor = RGBColor(0, 191, 255);
const DODGER_BLUE: RGBColor = RGBColor(30, 144, 255);
const TIME_FORMAT: &str = "%b-%d %Hh";
const NO_DATA_NOTICE: &str = "No data available to create visualizations.";

/// Mode of the written dashboard, temporary files are created owner-only
#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

/// What to render and where
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub city_label: &'a str,
    pub units: Units,
    pub output: &'a Path,
    pub show: bool,
}

/// Renders the four view dashboard into one image
///
/// An empty series is not an error, a notice is logged and nothing is written. Otherwise the
/// image is drawn into a temporary file next to the destination and only moved into place once
/// every view has been drawn, so a failed run never leaves a partial dashboard behind.
///
/// Returns the path of the written image, or None if there was nothing to render.
///
/// # Arguments
///
/// * 'series' - the shaped forecast
/// * 'request' - city label, units, destination and whether to open the image afterwards
/// * 'layout' - canvas settings
pub fn render(series: &ForecastSeries, request: &RenderRequest, layout: &Dashboard) -> Result<Option<PathBuf>, RenderError> {
    if series.is_empty() {
        warn!("{}", NO_DATA_NOTICE);
        return Ok(None);
    }

    let dir = request.output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let extension = request.output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png");

    let temp = tempfile::Builder::new()
        .prefix(".weather_dashboard_")
        .suffix(&format!(".{}", extension))
        .tempfile_in(dir)?;

    draw_dashboard(series, request, layout, temp.path())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(temp.path(), std::fs::Permissions::from_mode(OUTPUT_MODE))?;
    }

    temp.persist(request.output).map_err(|e| RenderError::Io(e.error))?;
    info!("dashboard saved to {}", request.output.display());

    if request.show {
        show(request.output);
    }

    Ok(Some(request.output.to_path_buf()))
}

/// Returns the default image path for a city
///
/// Only alphanumerics, '-' and '_' are kept from the city name.
///
/// # Arguments
///
/// * 'city' - the requested city
/// * 'output_dir' - optional directory to place the image in
pub fn default_output_path(city: &str, output_dir: Option<&str>) -> PathBuf {
    let safe_city: String = city
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    let safe_city = if safe_city.is_empty() { "forecast".to_string() } else { safe_city };
    let file_name = format!("{}_weather_dashboard.png", safe_city);

    match output_dir {
        Some(dir) => Path::new(dir).join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Draws all four views on a 2x2 grid under a common title
///
/// # Arguments
///
/// * 'series' - a non-empty forecast series
/// * 'request' - render request
/// * 'layout' - canvas settings
/// * 'path' - file to draw into
fn draw_dashboard(series: &ForecastSeries, request: &RenderRequest, layout: &Dashboard, path: &Path) -> Result<(), RenderError> {
    let root = BitMapBackend::new(path, (layout.width, layout.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let title = format!("5-Day Weather Forecast for {}", title_case(request.city_label.trim()));
    let title_style = (FONT, 48).into_font().style(FontStyle::Bold).color(&TITLE_COLOR);
    let body = root.titled(&title, title_style)?.margin(10, 10, 20, 20);

    let areas = body.split_evenly((2, 2));
    draw_temperature(&areas[0], &views::temperature_trend(series), request.units)?;
    draw_humidity(&areas[1], &views::humidity_trend(series))?;
    draw_wind(&areas[2], &views::wind_bars(series), request.units)?;
    draw_shares(&areas[3], &views::weather_shares(series))?;

    root.present()?;

    Ok(())
}

fn draw_temperature<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, view: &TemperatureTrend, units: Units) -> Result<(), RenderError> {
    let unit = units.temperature_label();
    let mut chart = ChartBuilder::on(area)
        .caption("Temperature Trends", (FONT, 32).into_font().style(FontStyle::Bold))
        .margin(15)
        .x_label_area_size(70)
        .y_label_area_size(80)
        .build_cartesian_2d(RangedDateTime::from(view.time_range.clone()), view.value_range.clone())?;

    chart
        .configure_mesh()
        .x_desc("Date and Time")
        .y_desc(format!("Temperature ({})", unit))
        .x_labels(8)
        .x_label_formatter(&|dt: &NaiveDateTime| dt.format(TIME_FORMAT).to_string())
        .light_line_style(BLACK.mix(0.1))
        .draw()?;

    chart
        .draw_series(LineSeries::new(view.temperature.iter().copied(), CRIMSON.stroke_width(3)).point_size(4))?
        .label(format!("Temperature ({})", unit))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], CRIMSON.stroke_width(3)));
    chart
        .draw_series(LineSeries::new(view.feels_like.iter().copied(), ORANGE.stroke_width(2)))?
        .label(format!("Feels Like ({})", unit))
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ORANGE.stroke_width(2)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font((FONT, 18))
        .draw()?;

    Ok(())
}

fn draw_humidity<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, view: &HumidityTrend) -> Result<(), RenderError> {
    let mut chart = ChartBuilder::on(area)
        .caption("Humidity Levels", (FONT, 32).into_font().style(FontStyle::Bold))
        .margin(15)
        .x_label_area_size(70)
        .y_label_area_size(80)
        .build_cartesian_2d(RangedDateTime::from(view.time_range.clone()), 0f64..100f64)?;

    chart
        .configure_mesh()
        .x_desc("Date and Time")
        .y_desc("Humidity (%)")
        .x_labels(8)
        .x_label_formatter(&|dt: &NaiveDateTime| dt.format(TIME_FORMAT).to_string())
        .light_line_style(BLACK.mix(0.1))
        .draw()?;

    chart.draw_series(
        AreaSeries::new(view.humidity.iter().copied(), 0.0, DEEP_SKY_BLUE.mix(0.3))
            .border_style(DODGER_BLUE.stroke_width(2)),
    )?;
    chart.draw_series(view.humidity.iter().map(|(t, h)| Circle::new((*t, *h), 3, DODGER_BLUE.filled())))?;

    Ok(())
}

fn draw_wind<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, bars: &[WindBar], units: Units) -> Result<(), RenderError> {
    let count = bars.len().max(1) as f64;
    let top = bars.iter().map(|b| b.speed).fold(0.0, f64::max).max(1.0) * 1.1;
    let ticks: Vec<f64> = (0..bars.len()).map(|i| i as f64).collect();
    let label_at = |x: &f64| wind_label_at(bars, *x);

    let mut chart = ChartBuilder::on(area)
        .caption("Wind Speed Forecast", (FONT, 32).into_font().style(FontStyle::Bold))
        .margin(15)
        .x_label_area_size(150)
        .y_label_area_size(80)
        .build_cartesian_2d((-0.5f64..count - 0.5).with_key_points(ticks), 0f64..top)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Date and Time")
        .y_desc(format!("Wind Speed ({})", units.wind_speed_label()))
        .x_label_formatter(&label_at)
        .x_label_style((FONT, 14).into_font().transform(FontTransform::Rotate90))
        .axis_desc_style((FONT, 18))
        .light_line_style(BLACK.mix(0.1))
        .draw()?;

    chart.draw_series(bars.iter().enumerate().map(|(i, b)| {
        let (left, right) = wind_bar_span(i);
        Rectangle::new([(left, 0.0), (right, b.speed)], views::wind_color(b.intensity).filled())
    }))?;

    Ok(())
}

/// Horizontal extent of the bar at the given position, centred on its tick
///
fn wind_bar_span(index: usize) -> (f64, f64) {
    let x = index as f64;
    (x - 0.4, x + 0.4)
}

/// Label for the tick at the given x position, ticks sit on whole numbers
///
fn wind_label_at(bars: &[WindBar], x: f64) -> String {
    if x < -0.5 {
        return String::new();
    }
    bars.get(x.round() as usize)
        .map(|b| b.label.clone())
        .unwrap_or_default()
}

fn draw_shares<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, shares: &[WeatherShare]) -> Result<(), RenderError> {
    let area = area.titled("Dominant Weather Conditions", (FONT, 32).into_font().style(FontStyle::Bold))?;

    let (center, radius) = pie_geometry(area.get_base_pixel(), area.dim_in_pixel());
    let sizes: Vec<f64> = shares.iter().map(|s| s.count as f64).collect();
    let colors: Vec<RGBColor> = (0..shares.len()).map(views::share_color).collect();
    let labels: Vec<String> = shares.iter().map(|s| format!("{} ({:.1}%)", s.label, s.percent())).collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(140.0);
    pie.label_style((FONT, 20).into_font().color(&BLACK));
    area.draw(&pie)?;

    Ok(())
}

/// Centre and radius of the pie inside an area
///
/// A pie is drawn in backend pixels rather than area coordinates, so the centre has to be moved
/// to where the area sits on the canvas.
///
/// # Arguments
///
/// * 'base' - top left corner of the area on the canvas
/// * 'size' - width and height of the area
fn pie_geometry(base: (i32, i32), size: (u32, u32)) -> ((i32, i32), f64) {
    let (width, height) = size;
    let center = (base.0 + width as i32 / 2, base.1 + height as i32 / 2);
    let radius = width.min(height) as f64 * 0.3;

    (center, radius)
}

/// Opens the image in the system viewer, if there is a display to show it on
///
/// # Arguments
///
/// * 'path' - image to open
fn show(path: &Path) {
    let has_display = ["DISPLAY", "WAYLAND_DISPLAY"]
        .iter()
        .any(|v| env::var_os(v).is_some_and(|s| !s.is_empty()));
    if !has_display {
        info!("no display available, not opening {}", path.display());
        return;
    }

    if let Err(e) = open::that(path) {
        warn!("could not open {}: {}", path.display(), e);
    }
}

/// Error depicting errors that occur while drawing or writing the dashboard
///
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("DrawingError: {0}")]
    Draw(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Draw(e.to_string())
    }
}
