//! Horizontal trajectory plus vertical profile for a single flight.

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::basemap::TileFetcher;
use crate::canvas::{render_err, MapCanvas};
use crate::config::{self, CanvasOptions};
use crate::dataset::{self, FlightEvent};
use crate::error::PlotError;
use crate::geometry::projection;
use crate::style;

/// Width of the altitude colourbar strip beside the map panel, in pixels.
const COLORBAR_WIDTH: u32 = 90;

/// Renders the two-panel flight event figure: a map view of the flown track
/// with events coloured by altitude on top, and altitude against time below.
///
/// Panels share the 2:1 height ratio of the source figure. Events without an
/// altitude still shape the track line and the time axis but get no marker.
pub fn render_flight_events(
    events: &[FlightEvent],
    flight_id: &str,
    fetcher: &dyn TileFetcher,
    path: &Path,
    options: &CanvasOptions,
) -> Result<(), PlotError> {
    let rows = dataset::events_for_flight(events, flight_id);
    if rows.is_empty() {
        return Err(PlotError::NoData {
            what: format!("events for flight {flight_id}"),
        });
    }

    let mut canvas_options = options.clone();
    if canvas_options.title.is_none() {
        canvas_options.title = Some(format!("Horizontal Trajectory – Flight {flight_id}"));
    }
    let mut canvas = MapCanvas::new(canvas_options);

    let track = projection::path_to_mercator(rows.iter().map(|e| (e.longitude, e.latitude)));
    canvas.push_line(track, style::TRAJECTORY_COLOR, config::EVENT_PADDING)?;

    // Raw altitudes come in hundredths; the profile axis is labelled in feet.
    let mut marks = Vec::new();
    let mut mark_values = Vec::new();
    let mut samples: Vec<(DateTime<Utc>, f64)> = Vec::new();
    for event in &rows {
        let Some(raw) = event.altitude else { continue };
        let feet = raw / 100.0;
        marks.push(projection::lon_lat_to_mercator(event.longitude, event.latitude));
        mark_values.push(feet);
        samples.push((event.event_time, feet));
    }
    let feet_range = if mark_values.is_empty() {
        None
    } else {
        let lo = mark_values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = mark_values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some((lo, hi))
    };
    if !marks.is_empty() {
        canvas.push_points(marks, mark_values)?;
    }

    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let (upper, profile_area) = root.split_vertically(options.height * 2 / 3);

    // Marker colours get a colourbar; without altitudes there is no scale
    // to draw and the map takes the full panel width.
    if let Some((lo, hi)) = feet_range {
        let (map_area, bar_area) =
            upper.split_horizontally(options.width.saturating_sub(COLORBAR_WIDTH));
        canvas.draw_on(&map_area, fetcher)?;
        draw_colorbar(&bar_area, lo, hi)?;
    } else {
        canvas.draw_on(&upper, fetcher)?;
    }
    let span = (rows.first().map(|e| e.event_time), rows.last().map(|e| e.event_time));
    if let (Some(start), Some(end)) = span {
        draw_profile(&profile_area, start, end, &samples)?;
    }

    root.present().map_err(render_err)?;
    tracing::info!(path = %path.display(), flight = flight_id, "wrote flight event figure");
    Ok(())
}

fn draw_profile(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    samples: &[(DateTime<Utc>, f64)],
) -> Result<(), PlotError> {
    // A single event gives a zero-width time axis; widen it a little.
    let (start, end) = if start == end {
        (start - Duration::minutes(1), end + Duration::minutes(1))
    } else {
        (start, end)
    };

    let mut feet_lo = f64::INFINITY;
    let mut feet_hi = f64::NEG_INFINITY;
    for &(_, feet) in samples {
        feet_lo = feet_lo.min(feet);
        feet_hi = feet_hi.max(feet);
    }
    let (axis_lo, axis_hi) = if feet_lo.is_finite() {
        let span = feet_hi - feet_lo;
        if span == 0.0 {
            (feet_lo - 50.0, feet_hi + 50.0)
        } else {
            (feet_lo - span * 0.05, feet_hi + span * 0.05)
        }
    } else {
        (0.0, 1.0)
    };

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption("Vertical Profile (Altitude vs Time)", ("sans-serif", 22))
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(start..end, axis_lo..axis_hi)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_labels(8)
        .x_label_formatter(&|t| t.format("%H:%M").to_string())
        .x_desc("Time (UTC)")
        .y_desc("Altitude (ft)")
        .label_style(("sans-serif", 14))
        .axis_desc_style(("sans-serif", 16))
        .draw()
        .map_err(render_err)?;

    if samples.is_empty() {
        return Ok(());
    }
    chart
        .draw_series(LineSeries::new(
            samples.iter().copied(),
            style::TRAJECTORY_COLOR.stroke_width(style::LINE_WIDTH),
        ))
        .map_err(render_err)?;
    let ramp = style::altitude_ramp(feet_lo, feet_hi);
    chart
        .draw_series(samples.iter().map(|&(time, feet)| {
            Circle::new((time, feet), style::PROFILE_MARKER_SIZE, ramp(feet).filled())
        }))
        .map_err(render_err)?;
    Ok(())
}

/// Vertical viridis bar mapping the map markers' colours back to altitudes.
fn draw_colorbar(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    lo: f64,
    hi: f64,
) -> Result<(), PlotError> {
    // A single altitude value still gets a readable scale.
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 50.0, hi + 50.0) };

    let mut bar = ChartBuilder::on(area)
        .margin_top(45)
        .margin_bottom(60)
        .margin_right(4)
        .set_label_area_size(LabelAreaPosition::Right, 52)
        .build_cartesian_2d(0.0..1.0, lo..hi)
        .map_err(render_err)?;

    let ramp = style::altitude_ramp(lo, hi);
    let steps = 100;
    let band = (hi - lo) / steps as f64;
    bar.draw_series((0..steps).map(|i| {
        let value = lo + band * i as f64;
        Rectangle::new([(0.0, value), (1.0, value + band)], ramp(value).filled())
    }))
    .map_err(render_err)?;

    bar.configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .y_labels(6)
        .y_label_formatter(&|v| format!("{v:.0}"))
        .label_style(("sans-serif", 12))
        .draw()
        .map_err(render_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basemap::SolidTileFetcher;
    use chrono::TimeZone;

    fn event(flight: &str, minute: u32, lon: f64, lat: f64, altitude: Option<f64>) -> FlightEvent {
        FlightEvent {
            flight_id: flight.to_string(),
            event_type: "position".to_string(),
            event_time: Utc.with_ymd_and_hms(2023, 6, 1, 10, minute, 0).unwrap(),
            longitude: lon,
            latitude: lat,
            altitude,
        }
    }

    #[test]
    fn unknown_flight_id_is_a_no_data_error() {
        let events = [event("AB123", 0, 8.5, 47.4, Some(1000.0))];
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("events.png");
        let fetcher = SolidTileFetcher::new([240, 240, 240, 255]).unwrap();

        let result = render_flight_events(
            &events,
            "ZZ999",
            &fetcher,
            &out,
            &CanvasOptions::default(),
        );
        assert!(matches!(result, Err(PlotError::NoData { .. })));
        assert!(!out.exists());
    }

    #[test]
    fn renders_map_and_profile_panels() {
        let events = [
            event("AB123", 0, 8.50, 47.40, Some(5000.0)),
            event("AB123", 5, 8.60, 47.45, Some(15000.0)),
            event("AB123", 10, 8.70, 47.50, Some(32000.0)),
            event("AB123", 15, 8.80, 47.55, None),
        ];
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("events.png");
        let fetcher = SolidTileFetcher::new([240, 240, 240, 255]).unwrap();

        let options = CanvasOptions {
            width: config::EVENT_FIGURE_SIZE.0,
            height: config::EVENT_FIGURE_SIZE.1,
            ..CanvasOptions::default()
        };
        render_flight_events(&events, "AB123", &fetcher, &out, &options).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn altitude_scale_appears_beside_the_map() {
        let events = [
            event("AB123", 0, 8.50, 47.40, Some(5000.0)),
            event("AB123", 10, 8.70, 47.50, Some(32000.0)),
        ];
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("events.png");
        // White tiles, so anything non-white in the bar strip is the scale.
        let fetcher = SolidTileFetcher::new([255, 255, 255, 255]).unwrap();

        let options = CanvasOptions {
            width: config::EVENT_FIGURE_SIZE.0,
            height: config::EVENT_FIGURE_SIZE.1,
            ..CanvasOptions::default()
        };
        render_flight_events(&events, "AB123", &fetcher, &out, &options).unwrap();

        let img = image::open(&out).unwrap().to_rgb8();
        let x = config::EVENT_FIGURE_SIZE.0 - COLORBAR_WIDTH + 15;
        let y = config::EVENT_FIGURE_SIZE.1 / 3;
        assert_ne!(img.get_pixel(x, y).0, [255, 255, 255]);
    }

    #[test]
    fn renders_even_when_no_event_has_an_altitude() {
        let events = [
            event("AB123", 0, 8.50, 47.40, None),
            event("AB123", 5, 8.60, 47.45, None),
        ];
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("events.png");
        let fetcher = SolidTileFetcher::new([240, 240, 240, 255]).unwrap();

        render_flight_events(&events, "AB123", &fetcher, &out, &CanvasOptions::default())
            .unwrap();
        assert!(out.exists());
    }
}
