//! Console summaries of the loaded datasets, printed before rendering.

use std::collections::BTreeMap;

use comfy_table::{Attribute, Cell, CellAlignment, Table};
use plotters::style::RGBColor;

use crate::dataset::{AirspaceVertex, FlightEvent, FlightPathPoint, FlightRecord};
use crate::style;

fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .add_attribute(Attribute::Bold)
        .set_alignment(CellAlignment::Center)
}

fn new_table(columns: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .set_header(columns.iter().map(|c| header_cell(c)).collect::<Vec<_>>())
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED);
    table
}

fn print_warnings(warnings: &[String]) {
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in warnings {
            println!("{}", warning);
        }
    }
    println!();
}

pub fn print_airspace_summary(vertices: &[AirspaceVertex]) {
    let mut by_airspace: BTreeMap<&str, usize> = BTreeMap::new();
    for vertex in vertices {
        *by_airspace.entry(vertex.airspace_id.as_str()).or_insert(0) += 1;
    }

    let mut table = new_table(&["", "Airspace", "Vertices"]);
    let mut warnings = Vec::new();
    for (airspace, count) in by_airspace {
        let mut row = vec![
            Cell::new("✅").set_alignment(CellAlignment::Center),
            Cell::new(airspace),
            Cell::new(count).set_alignment(CellAlignment::Center),
        ];
        if count < 3 {
            warnings.push(format!(
                "  ⚠️{}: {} vertices cannot close a polygon",
                airspace, count
            ));
            row[0] = Cell::new("⚠️");
        }
        table.add_row(row);
    }

    println!("\nAirspace summary:\n{}", table);
    print_warnings(&warnings);
}

pub fn print_path_summary(points: &[FlightPathPoint], heading: &str) {
    struct PathStats {
        count: usize,
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
    }

    let mut by_flight: BTreeMap<&str, PathStats> = BTreeMap::new();
    for point in points {
        let entry = by_flight
            .entry(point.ectrl_id.as_str())
            .or_insert(PathStats {
                count: 0,
                lat_min: point.latitude,
                lat_max: point.latitude,
                lon_min: point.longitude,
                lon_max: point.longitude,
            });
        entry.count += 1;
        entry.lat_min = entry.lat_min.min(point.latitude);
        entry.lat_max = entry.lat_max.max(point.latitude);
        entry.lon_min = entry.lon_min.min(point.longitude);
        entry.lon_max = entry.lon_max.max(point.longitude);
    }

    let mut table = new_table(&["", "Flight", "Points", "Latitude (°)", "Longitude (°)"]);
    let mut warnings = Vec::new();
    for (flight, stats) in by_flight {
        let mut row = vec![
            Cell::new("✅").set_alignment(CellAlignment::Center),
            Cell::new(flight),
            Cell::new(stats.count).set_alignment(CellAlignment::Center),
            Cell::new(format!("{:.2}…{:.2}", stats.lat_min, stats.lat_max))
                .set_alignment(CellAlignment::Center),
            Cell::new(format!("{:.2}…{:.2}", stats.lon_min, stats.lon_max))
                .set_alignment(CellAlignment::Center),
        ];
        if stats.count < 2 {
            warnings.push(format!("  ⚠️{}: a single point cannot form a line", flight));
            row[0] = Cell::new("⚠️");
        }
        table.add_row(row);
    }

    println!("\n{} summary:\n{}", heading, table);
    print_warnings(&warnings);
}

pub fn print_event_summary(events: &[FlightEvent]) {
    let mut by_flight: BTreeMap<&str, Vec<&FlightEvent>> = BTreeMap::new();
    for event in events {
        by_flight
            .entry(event.flight_id.as_str())
            .or_default()
            .push(event);
    }

    let mut table = new_table(&[
        "",
        "Flight",
        "Events",
        "First",
        "Last",
        "Altitude (ft)",
        "Ramp",
    ]);
    let mut warnings = Vec::new();
    for (flight, mut rows) in by_flight {
        rows.sort_by_key(|e| e.event_time);
        let altitudes: Vec<f64> = rows
            .iter()
            .filter_map(|e| e.altitude)
            .map(|a| a / 100.0)
            .collect();

        let (first, last) = match (rows.first(), rows.last()) {
            (Some(first), Some(last)) => (
                first.event_time.format("%H:%M:%S").to_string(),
                last.event_time.format("%H:%M:%S").to_string(),
            ),
            _ => ("n/a".to_string(), "n/a".to_string()),
        };
        let (range, bar) = match (
            altitudes.iter().copied().reduce(f64::min),
            altitudes.iter().copied().reduce(f64::max),
        ) {
            (Some(lo), Some(hi)) => (format!("{:.0}…{:.0}", lo, hi), gradient_bar(lo, hi)),
            _ => ("n/a".to_string(), "n/a".to_string()),
        };

        let mut row = vec![
            Cell::new("✅").set_alignment(CellAlignment::Center),
            Cell::new(flight),
            Cell::new(rows.len()).set_alignment(CellAlignment::Center),
            Cell::new(first).set_alignment(CellAlignment::Center),
            Cell::new(last).set_alignment(CellAlignment::Center),
            Cell::new(range).set_alignment(CellAlignment::Center),
            Cell::new(bar),
        ];
        if altitudes.is_empty() {
            warnings.push(format!(
                "  ⚠️{}: no event carries an altitude, the profile panel will be empty",
                flight
            ));
            row[0] = Cell::new("⚠️");
        }
        table.add_row(row);
    }

    println!("\nFlight event summary:\n{}", table);
    print_warnings(&warnings);
}

pub fn print_flight_summary(flights: &[FlightRecord]) {
    #[derive(Default)]
    struct AirportStats {
        departures: usize,
        arrivals: usize,
        missing: usize,
    }

    let mut by_airport: BTreeMap<&str, AirportStats> = BTreeMap::new();
    for flight in flights {
        let departure = by_airport.entry(flight.adep.as_str()).or_default();
        departure.departures += 1;
        departure.missing += usize::from(flight.filed_off_block.is_none())
            + usize::from(flight.actual_off_block.is_none());

        let arrival = by_airport.entry(flight.ades.as_str()).or_default();
        arrival.arrivals += 1;
        arrival.missing += usize::from(flight.filed_arrival.is_none())
            + usize::from(flight.actual_arrival.is_none());
    }

    let mut table = new_table(&["", "Airport", "Departures", "Arrivals"]);
    let mut warnings = Vec::new();
    for (airport, stats) in by_airport {
        let mut row = vec![
            Cell::new("✅").set_alignment(CellAlignment::Center),
            Cell::new(airport),
            Cell::new(stats.departures).set_alignment(CellAlignment::Center),
            Cell::new(stats.arrivals).set_alignment(CellAlignment::Center),
        ];
        if stats.missing > 0 {
            warnings.push(format!(
                "  ⚠️{}: {} schedule times are missing and will be skipped by the histogram",
                airport, stats.missing
            ));
            row[0] = Cell::new("⚠️");
        }
        table.add_row(row);
    }

    println!("\nFlight summary:\n{}", table);
    print_warnings(&warnings);
}

fn gradient_bar(lo: f64, hi: f64) -> String {
    let ramp = style::altitude_ramp(lo, hi);
    let mut bar = String::new();
    let n = 10;
    for i in 0..n {
        let value = lo + (hi - lo) * i as f64 / (n - 1) as f64;
        let RGBColor(r, g, b) = ramp(value);
        bar.push_str(&format!("\x1b[38;2;{};{};{}m█\x1b[0m", r, g, b));
    }
    bar
}
