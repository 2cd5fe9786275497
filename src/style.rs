//! Fixed styling shared by every figure.
//!
//! There is no styling system: each layer kind draws with one hardcoded
//! look. Colour values are the CSS named colours spelled out in comments.

use colorgrad::{Gradient, preset};
use plotters::style::RGBColor;

pub const AIRSPACE_FILL: RGBColor = RGBColor(173, 216, 230); // lightblue
pub const AIRSPACE_EDGE: RGBColor = RGBColor(0, 0, 139); // darkblue
/// Whole-polygon alpha: fill and edge both draw washed out.
pub const AIRSPACE_ALPHA: f64 = 0.3;

pub const ROUTE_COLOR: RGBColor = RGBColor(220, 20, 60); // crimson
pub const TRAJECTORY_COLOR: RGBColor = RGBColor(0, 0, 255); // blue

/// Cycle used when the CLI overlays several flights on one canvas.
pub const TRAJECTORY_PALETTE: [RGBColor; 6] = [
    RGBColor(0, 0, 255),    // blue
    RGBColor(255, 140, 0),  // darkorange
    RGBColor(34, 139, 34),  // forestgreen
    RGBColor(199, 21, 133), // mediumvioletred
    RGBColor(0, 139, 139),  // darkcyan
    RGBColor(139, 69, 19),  // saddlebrown
];

pub const LABEL_COLOR: RGBColor = RGBColor(128, 128, 128); // grey
pub const LABEL_ALPHA: f64 = 0.8;

pub const FILED_DEPARTURE_COLOR: RGBColor = RGBColor(135, 206, 235); // skyblue
pub const ACTUAL_DEPARTURE_COLOR: RGBColor = RGBColor(70, 130, 180); // steelblue
pub const FILED_ARRIVAL_COLOR: RGBColor = RGBColor(240, 128, 128); // lightcoral
pub const ACTUAL_ARRIVAL_COLOR: RGBColor = RGBColor(205, 92, 92); // indianred
pub const BAR_ALPHA: f64 = 0.8;

pub const LINE_WIDTH: u32 = 2;
pub const MARKER_SIZE: i32 = 4;
pub const PROFILE_MARKER_SIZE: i32 = 3;

/// Viridis ramp over `[lo, hi]` for altitude-coloured event markers.
///
/// Values outside the range clamp to the ramp ends; a degenerate range maps
/// everything to the middle of the ramp.
pub fn altitude_ramp(lo: f64, hi: f64) -> impl Fn(f64) -> RGBColor {
    let grad = preset::viridis();
    move |value: f64| {
        let span = hi - lo;
        let t = if span > 0.0 {
            ((value - lo) / span) as f32
        } else {
            0.5
        };
        let [r, g, b, _] = grad.at(t.clamp(0.0, 1.0)).to_rgba8();
        RGBColor(r, g, b)
    }
}
