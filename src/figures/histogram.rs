//! Hourly departure and arrival distribution for one airport.

use std::path::Path;

use chrono::{DateTime, Timelike, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::canvas::render_err;
use crate::config::CanvasOptions;
use crate::dataset::FlightRecord;
use crate::error::PlotError;
use crate::style;

/// Bins timestamps by their UTC hour of day.
pub fn hour_counts<I>(times: I) -> [u32; 24]
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut counts = [0u32; 24];
    for time in times {
        counts[time.hour() as usize] += 1;
    }
    counts
}

/// Renders the paired filed-versus-actual histograms: departures from the
/// airport on the left, arrivals on the right, on a shared count axis.
///
/// Rows missing the relevant timestamp are skipped, not an error; an airport
/// no flight touches is.
pub fn render_hourly_histogram(
    flights: &[FlightRecord],
    airport: &str,
    path: &Path,
    options: &CanvasOptions,
) -> Result<(), PlotError> {
    let departures: Vec<&FlightRecord> = flights.iter().filter(|f| f.adep == airport).collect();
    let arrivals: Vec<&FlightRecord> = flights.iter().filter(|f| f.ades == airport).collect();
    if departures.is_empty() && arrivals.is_empty() {
        return Err(PlotError::NoData {
            what: format!("flights touching {airport}"),
        });
    }
    tracing::debug!(
        airport,
        departures = departures.len(),
        arrivals = arrivals.len(),
        "binning schedule times"
    );

    let filed_dep = hour_counts(departures.iter().filter_map(|f| f.filed_off_block));
    let actual_dep = hour_counts(departures.iter().filter_map(|f| f.actual_off_block));
    let filed_arr = hour_counts(arrivals.iter().filter_map(|f| f.filed_arrival));
    let actual_arr = hour_counts(arrivals.iter().filter_map(|f| f.actual_arrival));

    let peak = filed_dep
        .iter()
        .chain(&actual_dep)
        .chain(&filed_arr)
        .chain(&actual_arr)
        .copied()
        .max()
        .unwrap_or(0);
    let y_max = peak + (peak / 10).max(1);

    let root = BitMapBackend::new(path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;
    let title = match options.title.as_deref() {
        Some(title) => title.to_string(),
        None => format!("Daily Flight Distribution at {airport}"),
    };
    let titled = root.titled(&title, ("sans-serif", 24)).map_err(render_err)?;
    let (left, right) = titled.split_horizontally(options.width / 2);

    draw_panel(
        &left,
        &format!("{airport} Departures by Hour"),
        &filed_dep,
        &actual_dep,
        (style::FILED_DEPARTURE_COLOR, style::ACTUAL_DEPARTURE_COLOR),
        y_max,
        true,
    )?;
    draw_panel(
        &right,
        &format!("{airport} Arrivals by Hour"),
        &filed_arr,
        &actual_arr,
        (style::FILED_ARRIVAL_COLOR, style::ACTUAL_ARRIVAL_COLOR),
        y_max,
        false,
    )?;

    root.present().map_err(render_err)?;
    tracing::info!(path = %path.display(), airport, "wrote histogram figure");
    Ok(())
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    caption: &str,
    filed: &[u32; 24],
    actual: &[u32; 24],
    colors: (RGBColor, RGBColor),
    y_max: u32,
    with_y_desc: bool,
) -> Result<(), PlotError> {
    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .caption(caption, ("sans-serif", 18))
        .x_label_area_size(45)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..24f64, 0u32..y_max)
        .map_err(render_err)?;

    let hour_labels = |hour: &f64| format!("{hour:.0}");
    // The shared count axis is labelled on the left panel only.
    let no_labels = |_: &u32| String::new();
    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .disable_y_mesh()
        .x_labels(9)
        .x_label_formatter(&hour_labels)
        .x_desc("Hour of Day (UTC)")
        .label_style(("sans-serif", 14))
        .axis_desc_style(("sans-serif", 16));
    if with_y_desc {
        mesh.y_desc("Number of Flights");
    } else {
        mesh.y_label_formatter(&no_labels);
    }
    mesh.draw().map_err(render_err)?;

    let filed_style = colors.0.mix(style::BAR_ALPHA).filled();
    let actual_style = colors.1.mix(style::BAR_ALPHA).filled();
    chart
        .draw_series(filed.iter().enumerate().map(|(hour, &count)| {
            let h = hour as f64;
            Rectangle::new([(h + 0.08, 0), (h + 0.46, count)], filed_style)
        }))
        .map_err(render_err)?
        .label("Filed")
        .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 12, y + 6)], filed_style));
    chart
        .draw_series(actual.iter().enumerate().map(|(hour, &count)| {
            let h = hour as f64;
            Rectangle::new([(h + 0.54, 0), (h + 0.92, count)], actual_style)
        }))
        .map_err(render_err)?
        .label("Actual")
        .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 12, y + 6)], actual_style));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(("sans-serif", 14).into_font())
        .draw()
        .map_err(render_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 1, hour, minute, 0).unwrap()
    }

    fn flight(
        adep: &str,
        ades: &str,
        filed_off: Option<DateTime<Utc>>,
        actual_off: Option<DateTime<Utc>>,
    ) -> FlightRecord {
        FlightRecord {
            ectrl_id: "1".to_string(),
            adep: adep.to_string(),
            ades: ades.to_string(),
            filed_off_block: filed_off,
            actual_off_block: actual_off,
            filed_arrival: filed_off.map(|t| t + chrono::Duration::hours(2)),
            actual_arrival: actual_off.map(|t| t + chrono::Duration::hours(2)),
        }
    }

    #[test]
    fn hour_counts_bins_by_utc_hour() {
        let counts = hour_counts([at(0, 30), at(0, 59), at(12, 0), at(23, 59)]);
        assert_eq!(counts[0], 2);
        assert_eq!(counts[12], 1);
        assert_eq!(counts[23], 1);
        assert_eq!(counts.iter().sum::<u32>(), 4);
    }

    #[test]
    fn records_without_timestamps_are_skipped() {
        let flights = [
            flight("EGLL", "LFPG", Some(at(8, 15)), None),
            flight("EGLL", "EHAM", None, None),
        ];
        let counts = hour_counts(flights.iter().filter_map(|f| f.filed_off_block));
        assert_eq!(counts.iter().sum::<u32>(), 1);
        assert_eq!(counts[8], 1);
    }

    #[test]
    fn airport_without_flights_is_a_no_data_error() {
        let flights = [flight("EGLL", "LFPG", Some(at(8, 0)), Some(at(8, 20)))];
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("histogram.png");

        let result =
            render_hourly_histogram(&flights, "EDDF", &out, &CanvasOptions::default());
        assert!(matches!(result, Err(PlotError::NoData { .. })));
    }

    #[test]
    fn renders_both_panels_to_a_png() {
        let flights = [
            flight("EGLL", "LFPG", Some(at(7, 55)), Some(at(8, 10))),
            flight("EGLL", "EHAM", Some(at(8, 20)), Some(at(8, 40))),
            flight("LFPG", "EGLL", Some(at(17, 5)), None),
        ];
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("histogram.png");

        let options = CanvasOptions {
            width: crate::config::HISTOGRAM_FIGURE_SIZE.0,
            height: crate::config::HISTOGRAM_FIGURE_SIZE.1,
            ..CanvasOptions::default()
        };
        render_hourly_histogram(&flights, "EGLL", &out, &options).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
