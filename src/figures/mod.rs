//! Composed one-shot figures built on top of the map canvas.

pub mod events;
pub mod histogram;

pub use events::render_flight_events;
pub use histogram::render_hourly_histogram;
