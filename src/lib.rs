pub mod basemap;
pub mod canvas;
pub mod config;
pub mod dataset;
pub mod error;
pub mod extent;
pub mod figures;
pub mod geometry;
pub mod style;
pub mod ticks;
pub mod utils;

pub use canvas::MapCanvas;
pub use config::CanvasOptions;
pub use error::PlotError;
pub use extent::{BoundingBox, CanvasExtent};
