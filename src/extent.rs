//! Running drawing extent for a map canvas.
//!
//! Every feature added to a canvas contributes an axis-aligned bounding box
//! in projected Web Mercator metres. [`CanvasExtent`] folds those boxes into
//! a single running extent; the padded view window and the axis tick labels
//! are derived from it when the canvas is rendered.

use crate::error::PlotError;

/// Axis-aligned box in EPSG:3857 metres.
///
/// Construction validates the bounds, so a `BoundingBox` in hand is always
/// ordered on both axes. Zero width or height is allowed (a single point is
/// a valid box); `x_min > x_max` or a NaN coordinate is not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl BoundingBox {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self, PlotError> {
        // `!(a <= b)` also rejects NaN on either side.
        if !(x_min <= x_max) || !(y_min <= y_max) {
            return Err(PlotError::InvertedBounds {
                x_min,
                x_max,
                y_min,
                y_max,
            });
        }
        Ok(Self {
            x_min,
            x_max,
            y_min,
            y_max,
        })
    }

    /// Tight box around a non-empty sequence of projected points.
    pub fn from_points<I>(points: I) -> Result<Self, PlotError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut iter = points.into_iter();
        let Some((x0, y0)) = iter.next() else {
            return Err(PlotError::InsufficientPoints {
                shape: "bounding box",
                needed: 1,
                got: 0,
            });
        };
        let (mut x_min, mut x_max, mut y_min, mut y_max) = (x0, x0, y0, y0);
        for (x, y) in iter {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        // Catches an all-NaN input, which would otherwise slip through min/max.
        Self::new(x_min, x_max, y_min, y_max)
    }

    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Smallest box covering both inputs (pointwise min/max per axis).
    pub fn union(&self, other: &Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            x_max: self.x_max.max(other.x_max),
            y_min: self.y_min.min(other.y_min),
            y_max: self.y_max.max(other.y_max),
        }
    }

    /// Expands each axis symmetrically by `fraction` of its span.
    ///
    /// A fraction of 0.2 adds 20% of the width on the left and another 20%
    /// on the right, so the padded box is 40% wider overall. A degenerate
    /// axis has zero span and stays degenerate.
    pub fn padded(&self, fraction: f64) -> Self {
        let x_pad = self.width() * fraction;
        let y_pad = self.height() * fraction;
        Self {
            x_min: self.x_min - x_pad,
            x_max: self.x_max + x_pad,
            y_min: self.y_min - y_pad,
            y_max: self.y_max + y_pad,
        }
    }

    /// Grows any axis narrower than `min_span` to exactly `min_span`,
    /// centred on the old midpoint. Used at the render boundary so a
    /// single-point extent still yields a drawable, non-zero window.
    pub fn with_min_span(&self, min_span: f64) -> Self {
        let (cx, cy) = self.center();
        let mut out = *self;
        if out.width() < min_span {
            out.x_min = cx - min_span / 2.0;
            out.x_max = cx + min_span / 2.0;
        }
        if out.height() < min_span {
            out.y_min = cy - min_span / 2.0;
            out.y_max = cy + min_span / 2.0;
        }
        out
    }
}

/// Running union of feature boxes for one canvas.
///
/// Starts empty; `merge` folds in one feature box at a time. Merging is
/// commutative, associative and idempotent, so the order in which layers are
/// added never changes the final extent.
#[derive(Debug, Clone, Default)]
pub struct CanvasExtent {
    current: Option<BoundingBox>,
}

impl CanvasExtent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current extent, if any feature has been merged.
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.current
    }

    pub fn merge(&mut self, feature: BoundingBox) {
        self.current = Some(match self.current {
            Some(current) => current.union(&feature),
            None => feature,
        });
    }

    /// Padded view window for rendering.
    ///
    /// Fails if nothing has been merged yet: an empty canvas has no
    /// meaningful window to draw.
    pub fn view_window(&self, padding_fraction: f64) -> Result<BoundingBox, PlotError> {
        let bounds = self.current.ok_or(PlotError::EmptyExtent)?;
        Ok(bounds.padded(padding_fraction))
    }
}
