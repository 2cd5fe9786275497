//! Axis ticks for rendered map windows.
//!
//! Map axes are labelled in geographic degrees even though the drawing
//! happens in projected Web Mercator metres. Tick positions are evenly
//! spaced in the projected window; the label values are linearly
//! interpolated between the window's two re-projected corner points.

use crate::error::PlotError;
use crate::extent::BoundingBox;
use crate::geometry::projection::{self, WEB_MERCATOR, WGS84};

/// Ticks drawn per axis on every map figure.
pub const TICKS_PER_AXIS: usize = 6;

/// Tick positions in projected metres paired with their display labels.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisTicks {
    pub positions: Vec<f64>,
    pub labels: Vec<String>,
}

impl AxisTicks {
    /// Label of the tick nearest to `position`.
    ///
    /// The chart backend asks for a label per tick position it draws; going
    /// through nearest-match keeps the drawn strings identical to the
    /// derived set instead of re-deriving them in two places.
    pub fn label_for(&self, position: f64) -> String {
        let nearest = self
            .positions
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                let da = (*a - position).abs();
                let db = (*b - position).abs();
                da.total_cmp(&db)
            })
            .map(|(i, _)| i);
        match nearest {
            Some(i) => self.labels[i].clone(),
            None => format_degree(position),
        }
    }
}

/// `n` evenly spaced values covering `[lo, hi]`, both endpoints included.
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { hi } else { lo + step * i as f64 })
                .collect()
        }
    }
}

/// Derives degree tick labels for both axes of a view window.
///
/// Only the window's two extreme corners are re-projected to WGS84; the
/// label values in between are linearly interpolated. This is an
/// approximation: graticule lines are not evenly spaced in Mercator, so an
/// interpolated value drifts slightly from the true coordinate at that tick.
/// The drift is a known, accepted trade-off; re-projecting each tick
/// individually would change every label and is deliberately not done.
///
/// A degenerate window still yields exactly `axis_count` (identical) ticks
/// per axis.
pub fn degree_ticks(
    window: &BoundingBox,
    axis_count: usize,
) -> Result<(AxisTicks, AxisTicks), PlotError> {
    let (lon_min, lat_min) =
        projection::project_point(window.x_min(), window.y_min(), WEB_MERCATOR, WGS84)?;
    let (lon_max, lat_max) =
        projection::project_point(window.x_max(), window.y_max(), WEB_MERCATOR, WGS84)?;

    let x = AxisTicks {
        positions: linspace(window.x_min(), window.x_max(), axis_count),
        labels: linspace(lon_min, lon_max, axis_count)
            .into_iter()
            .map(format_degree)
            .collect(),
    };
    let y = AxisTicks {
        positions: linspace(window.y_min(), window.y_max(), axis_count),
        labels: linspace(lat_min, lat_max, axis_count)
            .into_iter()
            .map(format_degree)
            .collect(),
    };
    Ok((x, y))
}

/// One decimal place with a degree suffix, e.g. `8.5°`.
pub fn format_degree(value: f64) -> String {
    format!("{value:.1}°")
}
