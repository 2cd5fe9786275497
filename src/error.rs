use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the plotting pipeline.
///
/// Nothing is retried or recovered locally; every variant propagates to the
/// caller and aborts the plot it belongs to. Collaborator failures
/// (projection, tile service, chart backend) are passed through unchanged.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("not enough points for {shape}: need at least {needed}, got {got}")]
    InsufficientPoints {
        shape: &'static str,
        needed: usize,
        got: usize,
    },

    #[error("inverted bounding box: x [{x_min}, {x_max}], y [{y_min}, {y_max}]")]
    InvertedBounds {
        x_min: f64,
        x_max: f64,
        y_min: f64,
        y_max: f64,
    },

    #[error("no data matched {what}")]
    NoData { what: String },

    #[error("view window requested before any feature was merged")]
    EmptyExtent,

    #[error("projection EPSG:{from_crs} -> EPSG:{to_crs} failed: {reason}")]
    Projection {
        from_crs: i32,
        to_crs: i32,
        reason: String,
    },

    #[error("tile fetch failed for {url}: {reason}")]
    TileFetch { url: String, reason: String },

    #[error("chart backend error: {0}")]
    Render(String),

    #[error("failed to read {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
