//! Typed access to the CSV exports the figures are drawn from.
//!
//! Two families of files feed the plots: network-manager archives
//! (airspace boundaries, filed routes, flown trajectories, flight lists
//! with schedule times) and flight-event exports (time-stamped positions
//! with altitude). Loading is strict: the first malformed row fails the
//! whole load.

use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Deserializer};

use crate::error::PlotError;

/// Day-first timestamp format used by the network-manager archives.
const ARCHIVE_DATETIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// One vertex of an airspace boundary polygon.
#[derive(Debug, Clone, Deserialize)]
pub struct AirspaceVertex {
    #[serde(rename = "Airspace ID")]
    pub airspace_id: String,
    #[serde(rename = "Sequence Number")]
    pub sequence_number: u32,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
}

/// One point of a filed route or a flown trajectory, ordered by sequence
/// number within its flight. Both exports share the same columns.
#[derive(Debug, Clone, Deserialize)]
pub struct FlightPathPoint {
    #[serde(rename = "ECTRL ID")]
    pub ectrl_id: String,
    #[serde(rename = "Sequence Number")]
    pub sequence_number: u32,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
}

/// One row of a flight-event export: a time-stamped position with an
/// optional altitude in flight levels × 100.
#[derive(Debug, Clone, Deserialize)]
pub struct FlightEvent {
    pub flight_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(deserialize_with = "de_timestamp")]
    pub event_time: DateTime<Utc>,
    pub longitude: f64,
    pub latitude: f64,
    pub altitude: Option<f64>,
}

/// Filed and actual schedule times for one flight.
#[derive(Debug, Clone, Deserialize)]
pub struct FlightRecord {
    #[serde(rename = "ECTRL ID")]
    pub ectrl_id: String,
    #[serde(rename = "ADEP")]
    pub adep: String,
    #[serde(rename = "ADES")]
    pub ades: String,
    #[serde(rename = "FILED OFF BLOCK TIME", deserialize_with = "de_opt_timestamp")]
    pub filed_off_block: Option<DateTime<Utc>>,
    #[serde(rename = "ACTUAL OFF BLOCK TIME", deserialize_with = "de_opt_timestamp")]
    pub actual_off_block: Option<DateTime<Utc>>,
    #[serde(rename = "FILED ARRIVAL TIME", deserialize_with = "de_opt_timestamp")]
    pub filed_arrival: Option<DateTime<Utc>>,
    #[serde(rename = "ACTUAL ARRIVAL TIME", deserialize_with = "de_opt_timestamp")]
    pub actual_arrival: Option<DateTime<Utc>>,
}

/// Parses the timestamp spellings that appear across the exports: RFC 3339,
/// `YYYY-MM-DD HH:MM:SS`, and the archives' day-first
/// `DD-MM-YYYY HH:MM:SS`. All values are taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    NaiveDateTime::parse_from_str(s, ARCHIVE_DATETIME_FORMAT).map(|n| n.and_utc())
}

fn de_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_timestamp(s.trim()).map_err(serde::de::Error::custom)
}

fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    parse_timestamp(s).map(Some).map_err(serde::de::Error::custom)
}

/// Loads every row of a headed CSV export into typed records.
pub fn load_csv<T>(path: &Path) -> Result<Vec<T>, PlotError>
where
    T: serde::de::DeserializeOwned,
{
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| PlotError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut rows = Vec::new();
    for record in rdr.deserialize() {
        rows.push(record.map_err(|e| PlotError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?);
    }
    tracing::debug!(path = %path.display(), rows = rows.len(), "loaded csv");
    Ok(rows)
}

/// Route or trajectory rows for one flight, ordered by sequence number.
pub fn path_for_flight<'a>(
    points: &'a [FlightPathPoint],
    ectrl_id: &str,
) -> Vec<&'a FlightPathPoint> {
    let mut rows: Vec<&FlightPathPoint> = points
        .iter()
        .filter(|p| p.ectrl_id == ectrl_id)
        .collect();
    rows.sort_by_key(|p| p.sequence_number);
    rows
}

/// Events for one flight, ordered by event time.
pub fn events_for_flight<'a>(events: &'a [FlightEvent], flight_id: &str) -> Vec<&'a FlightEvent> {
    let mut rows: Vec<&FlightEvent> = events
        .iter()
        .filter(|e| e.flight_id == flight_id)
        .collect();
    rows.sort_by_key(|e| e.event_time);
    rows
}

/// Distinct ids in first-seen order.
pub fn distinct_ids<T>(rows: &[T], id_of: impl Fn(&T) -> &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for row in rows {
        let id = id_of(row);
        if !seen.iter().any(|s| s == id) {
            seen.push(id.to_string());
        }
    }
    seen
}
