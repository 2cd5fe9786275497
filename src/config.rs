use crate::basemap::TileProvider;

/// Default square map figure, in pixels.
pub const MAP_FIGURE_SIZE: (u32, u32) = (800, 800);
/// Trajectory maps draw slightly larger than airspace and route maps.
pub const TRAJECTORY_FIGURE_SIZE: (u32, u32) = (1000, 1000);
/// Two-panel flight-event figure (map over altitude profile), in pixels.
pub const EVENT_FIGURE_SIZE: (u32, u32) = (1000, 1200);
/// Paired departure/arrival histogram figure, in pixels.
pub const HISTOGRAM_FIGURE_SIZE: (u32, u32) = (1200, 500);

/// View padding as a fraction of the extent span, per layer kind.
pub const AIRSPACE_PADDING: f64 = 0.2;
pub const ROUTE_PADDING: f64 = 0.2;
pub const TRAJECTORY_PADDING: f64 = 0.3;
pub const EVENT_PADDING: f64 = 0.2;

/// Narrowest axis span a rendered window may have, in Web Mercator metres.
/// About 0.01° of longitude at the equator; keeps a single-point extent
/// visible instead of collapsing the view to a zero-width slice.
pub const MIN_AXIS_SPAN_M: f64 = 1113.2;

/// Per-canvas rendering knobs.
///
/// The `Option` fields override choices the canvas otherwise makes from the
/// layers added to it (title, padding fraction, tile provider).
#[derive(Debug, Clone)]
pub struct CanvasOptions {
    pub width: u32,
    pub height: u32,
    pub title: Option<String>,
    pub padding: Option<f64>,
    pub provider: Option<TileProvider>,
    /// Draw basemap tiles under the features.
    pub basemap: bool,
}

impl Default for CanvasOptions {
    fn default() -> Self {
        CanvasOptions {
            width: MAP_FIGURE_SIZE.0,
            height: MAP_FIGURE_SIZE.1,
            title: None,
            padding: None,
            provider: None,
            basemap: true,
        }
    }
}
