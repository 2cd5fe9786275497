//! The shared map canvas.
//!
//! A [`MapCanvas`] accumulates layers (airspace polygons, routes,
//! trajectories) together with their running extent, then draws everything
//! in one pass: derive the padded view window, fetch the basemap mosaic for
//! exactly that window, draw features in insertion order, and label the
//! axes in geographic degrees. Layers can be added in any order; the
//! rendered window depends only on the set of layers, not the sequence.

use std::path::Path;

use image::DynamicImage;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontDesc, FontFamily, FontStyle};

use crate::basemap::{self, TileFetcher, TileProvider};
use crate::config::{self, CanvasOptions};
use crate::dataset::{AirspaceVertex, FlightPathPoint};
use crate::error::PlotError;
use crate::extent::{BoundingBox, CanvasExtent};
use crate::geometry::{self, projection};
use crate::style;
use crate::ticks::{self, TICKS_PER_AXIS};

pub(crate) struct Label {
    text: String,
    anchor: (f64, f64),
}

pub(crate) enum CanvasLayer {
    Polygon {
        ring: Vec<(f64, f64)>,
        label: Option<Label>,
    },
    Line {
        path: Vec<(f64, f64)>,
        color: RGBColor,
        label: Option<Label>,
        legend: Option<String>,
    },
    Points {
        pts: Vec<(f64, f64)>,
        values: Vec<f64>,
    },
}

pub struct MapCanvas {
    options: CanvasOptions,
    extent: CanvasExtent,
    layers: Vec<CanvasLayer>,
    // Last-added layer kind decides these unless the options override them.
    kind_padding: f64,
    kind_provider: TileProvider,
    kind_title: Option<String>,
    legend: bool,
}

impl MapCanvas {
    pub fn new(options: CanvasOptions) -> Self {
        MapCanvas {
            options,
            extent: CanvasExtent::new(),
            layers: Vec::new(),
            kind_padding: config::AIRSPACE_PADDING,
            kind_provider: TileProvider::positron(),
            kind_title: None,
            legend: false,
        }
    }

    /// Adds an airspace boundary polygon.
    ///
    /// With an id, only that airspace's vertices are used; without one the
    /// whole slice is treated as a single ring. A polygon needs at least
    /// three vertices.
    pub fn add_airspace(
        &mut self,
        vertices: &[AirspaceVertex],
        airspace_id: Option<&str>,
    ) -> Result<(), PlotError> {
        let mut rows: Vec<&AirspaceVertex> = match airspace_id {
            Some(id) => vertices.iter().filter(|v| v.airspace_id == id).collect(),
            None => vertices.iter().collect(),
        };
        if rows.len() < 3 {
            return Err(PlotError::InsufficientPoints {
                shape: "airspace polygon",
                needed: 3,
                got: rows.len(),
            });
        }
        rows.sort_by_key(|v| v.sequence_number);

        let ring =
            projection::path_to_mercator(rows.iter().map(|v| (v.longitude, v.latitude)));
        self.extent.merge(BoundingBox::from_points(ring.iter().copied())?);

        let name = airspace_id
            .map(str::to_string)
            .unwrap_or_else(|| rows[0].airspace_id.clone());
        tracing::debug!(airspace = %name, vertices = ring.len(), "added airspace layer");
        let label = geometry::ring_centroid(&ring).map(|anchor| Label { text: name, anchor });
        self.layers.push(CanvasLayer::Polygon { ring, label });
        self.kind_padding = config::AIRSPACE_PADDING;
        self.kind_provider = TileProvider::positron();
        Ok(())
    }

    /// Adds a filed route as a crimson line labelled at its midpoint.
    ///
    /// The slice is drawn as given (after ordering by sequence number);
    /// filtering a multi-flight file is the caller's job, see
    /// [`crate::dataset::path_for_flight`].
    pub fn add_route(
        &mut self,
        points: &[FlightPathPoint],
        route_id: &str,
    ) -> Result<(), PlotError> {
        let path = self.ordered_path(points, "route")?;
        tracing::debug!(route = route_id, points = path.len(), "added route layer");

        let label = geometry::path_midpoint(&path).map(|anchor| Label {
            text: route_id.to_string(),
            anchor,
        });
        self.layers.push(CanvasLayer::Line {
            path,
            color: style::ROUTE_COLOR,
            label,
            legend: None,
        });
        self.kind_padding = config::ROUTE_PADDING;
        self.kind_provider = TileProvider::mapnik();
        self.kind_title = Some("Routes".to_string());
        Ok(())
    }

    /// Adds a flown trajectory with a legend entry and a midpoint label.
    pub fn add_trajectory(
        &mut self,
        points: &[FlightPathPoint],
        flight_id: &str,
        color: Option<RGBColor>,
    ) -> Result<(), PlotError> {
        let path = self.ordered_path(points, "trajectory")?;
        tracing::debug!(flight = flight_id, points = path.len(), "added trajectory layer");

        let label = geometry::path_midpoint(&path).map(|anchor| Label {
            text: flight_id.to_string(),
            anchor,
        });
        self.layers.push(CanvasLayer::Line {
            path,
            color: color.unwrap_or(style::TRAJECTORY_COLOR),
            label,
            legend: Some(flight_id.to_string()),
        });
        self.legend = true;
        self.kind_padding = config::TRAJECTORY_PADDING;
        self.kind_provider = TileProvider::positron();
        self.kind_title = Some("Aircraft Trajectories".to_string());
        Ok(())
    }

    fn ordered_path(
        &mut self,
        points: &[FlightPathPoint],
        shape: &'static str,
    ) -> Result<Vec<(f64, f64)>, PlotError> {
        if points.is_empty() {
            return Err(PlotError::InsufficientPoints {
                shape,
                needed: 1,
                got: 0,
            });
        }
        let mut rows: Vec<&FlightPathPoint> = points.iter().collect();
        rows.sort_by_key(|p| p.sequence_number);
        let path =
            projection::path_to_mercator(rows.iter().map(|p| (p.longitude, p.latitude)));
        self.extent.merge(BoundingBox::from_points(path.iter().copied())?);
        Ok(path)
    }

    /// Bare line layer in projected coordinates, for composed figures.
    pub(crate) fn push_line(
        &mut self,
        path: Vec<(f64, f64)>,
        color: RGBColor,
        padding: f64,
    ) -> Result<(), PlotError> {
        self.extent.merge(BoundingBox::from_points(path.iter().copied())?);
        self.layers.push(CanvasLayer::Line {
            path,
            color,
            label: None,
            legend: None,
        });
        self.kind_padding = padding;
        Ok(())
    }

    /// Value-coloured markers in projected coordinates, for composed figures.
    pub(crate) fn push_points(
        &mut self,
        pts: Vec<(f64, f64)>,
        values: Vec<f64>,
    ) -> Result<(), PlotError> {
        self.extent.merge(BoundingBox::from_points(pts.iter().copied())?);
        self.layers.push(CanvasLayer::Points { pts, values });
        Ok(())
    }

    /// Extent merged so far, if any layer has been added.
    pub fn extent(&self) -> Option<BoundingBox> {
        self.extent.bounds()
    }

    /// Padded view window the next render would use, before the
    /// minimum-span guard is applied.
    pub fn view_window(&self) -> Result<BoundingBox, PlotError> {
        self.extent.view_window(self.effective_padding())
    }

    fn effective_padding(&self) -> f64 {
        self.options.padding.unwrap_or(self.kind_padding)
    }

    /// Renders the canvas to a PNG file.
    pub fn render(&self, fetcher: &dyn TileFetcher, path: &Path) -> Result<(), PlotError> {
        let root = BitMapBackend::new(path, (self.options.width, self.options.height))
            .into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        self.draw_on(&root, fetcher)?;
        root.present().map_err(render_err)?;
        tracing::info!(path = %path.display(), "wrote figure");
        Ok(())
    }

    /// Draws the canvas into an existing drawing area. Composed figures use
    /// this to place a map panel inside a larger layout.
    pub(crate) fn draw_on(
        &self,
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        fetcher: &dyn TileFetcher,
    ) -> Result<(), PlotError> {
        let window = self
            .extent
            .view_window(self.effective_padding())?
            .with_min_span(config::MIN_AXIS_SPAN_M);
        let (x_ticks, y_ticks) = ticks::degree_ticks(&window, TICKS_PER_AXIS)?;

        // Step the axes so drawn ticks land on the derived positions. The
        // step is shaved a hair so float accumulation cannot push the last
        // tick past the end of the range and drop it.
        let x_step = window.width() / (TICKS_PER_AXIS - 1) as f64 * (1.0 - 1e-9);
        let y_step = window.height() / (TICKS_PER_AXIS - 1) as f64 * (1.0 - 1e-9);

        let mut builder = ChartBuilder::on(area);
        builder
            .margin(10)
            .x_label_area_size(45)
            .y_label_area_size(70);
        if let Some(title) = self.options.title.as_ref().or(self.kind_title.as_ref()) {
            builder.caption(title, ("sans-serif", 22));
        }
        let mut chart = builder
            .build_cartesian_2d(
                (window.x_min()..window.x_max()).step(x_step),
                (window.y_min()..window.y_max()).step(y_step),
            )
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_labels(TICKS_PER_AXIS)
            .y_labels(TICKS_PER_AXIS)
            .x_label_formatter(&|v| x_ticks.label_for(*v))
            .y_label_formatter(&|v| y_ticks.label_for(*v))
            .x_desc("Longitude (°)")
            .y_desc("Latitude (°)")
            .label_style(("sans-serif", 14))
            .axis_desc_style(("sans-serif", 16))
            .draw()
            .map_err(render_err)?;

        if self.options.basemap {
            let provider = self
                .options
                .provider
                .clone()
                .unwrap_or_else(|| self.kind_provider.clone());
            let (pw, ph) = chart.plotting_area().dim_in_pixel();
            let mosaic = basemap::window_mosaic(fetcher, &provider, &window, (pw, ph))?;
            let rgb = DynamicImage::ImageRgba8(mosaic).to_rgb8().into_raw();
            let tiles: BitMapElement<(f64, f64)> = BitMapElement::with_owned_buffer(
                (window.x_min(), window.y_max()),
                (pw, ph),
                rgb,
            )
            .ok_or_else(|| PlotError::Render("basemap buffer size mismatch".to_string()))?;
            chart
                .draw_series(std::iter::once(tiles))
                .map_err(render_err)?;

            let (_, area_height) = area.dim_in_pixel();
            let credit = TextStyle::from(("sans-serif", 11).into_font()).color(&style::LABEL_COLOR);
            area.draw(&Text::new(
                provider.attribution.to_string(),
                (8, area_height as i32 - 16),
                credit,
            ))
            .map_err(render_err)?;
        }

        for layer in &self.layers {
            match layer {
                CanvasLayer::Polygon { ring, label } => {
                    chart
                        .draw_series(std::iter::once(Polygon::new(
                            ring.clone(),
                            style::AIRSPACE_FILL.mix(style::AIRSPACE_ALPHA).filled(),
                        )))
                        .map_err(render_err)?;
                    let mut edge = ring.clone();
                    if let Some(&first) = edge.first() {
                        edge.push(first);
                    }
                    chart
                        .draw_series(LineSeries::new(
                            edge,
                            style::AIRSPACE_EDGE
                                .mix(style::AIRSPACE_ALPHA)
                                .stroke_width(style::LINE_WIDTH),
                        ))
                        .map_err(render_err)?;
                    self.draw_label(&mut chart, label)?;
                }
                CanvasLayer::Line {
                    path,
                    color,
                    label,
                    legend,
                } => {
                    let series = chart
                        .draw_series(LineSeries::new(
                            path.iter().copied(),
                            color.stroke_width(style::LINE_WIDTH),
                        ))
                        .map_err(render_err)?;
                    if let Some(name) = legend {
                        let c = *color;
                        series.label(name).legend(move |(x, y)| {
                            PathElement::new(vec![(x, y), (x + 18, y)], c.stroke_width(2))
                        });
                    }
                    self.draw_label(&mut chart, label)?;
                }
                CanvasLayer::Points { pts, values } => {
                    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
                    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    let ramp = style::altitude_ramp(lo, hi);
                    chart
                        .draw_series(pts.iter().zip(values.iter()).map(|(&(x, y), &v)| {
                            Circle::new((x, y), style::MARKER_SIZE, ramp(v).filled())
                        }))
                        .map_err(render_err)?;
                }
            }
        }

        if self.legend {
            chart
                .configure_series_labels()
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .label_font(("sans-serif", 14).into_font())
                .draw()
                .map_err(render_err)?;
        }
        Ok(())
    }

    fn draw_label<X, Y>(
        &self,
        chart: &mut ChartContext<'_, BitMapBackend<'_>, Cartesian2d<X, Y>>,
        label: &Option<Label>,
    ) -> Result<(), PlotError>
    where
        X: plotters::coord::ranged1d::Ranged<ValueType = f64>,
        Y: plotters::coord::ranged1d::Ranged<ValueType = f64>,
    {
        let Some(label) = label else {
            return Ok(());
        };
        let font = FontDesc::new(FontFamily::SansSerif, 13.0, FontStyle::Bold);
        // The mixed colour must outlive the style borrowing it.
        let label_color = style::LABEL_COLOR.mix(style::LABEL_ALPHA);
        let text_style = TextStyle::from(font)
            .color(&label_color)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart
            .draw_series(std::iter::once(Text::new(
                label.text.clone(),
                label.anchor,
                text_style,
            )))
            .map_err(render_err)?;
        Ok(())
    }
}

pub(crate) fn render_err<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Render(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basemap::SolidTileFetcher;

    fn vertex(id: &str, seq: u32, lon: f64, lat: f64) -> AirspaceVertex {
        AirspaceVertex {
            airspace_id: id.to_string(),
            sequence_number: seq,
            latitude: lat,
            longitude: lon,
        }
    }

    fn point(id: &str, seq: u32, lon: f64, lat: f64) -> FlightPathPoint {
        FlightPathPoint {
            ectrl_id: id.to_string(),
            sequence_number: seq,
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn airspace_needs_three_vertices() {
        let mut canvas = MapCanvas::new(CanvasOptions::default());
        let result = canvas.add_airspace(
            &[vertex("A", 1, 0.0, 50.0), vertex("A", 2, 1.0, 50.0)],
            None,
        );
        assert!(matches!(
            result,
            Err(PlotError::InsufficientPoints {
                needed: 3,
                got: 2,
                ..
            })
        ));
        assert!(canvas.extent().is_none());
    }

    #[test]
    fn route_needs_at_least_one_point() {
        let mut canvas = MapCanvas::new(CanvasOptions::default());
        assert!(matches!(
            canvas.add_route(&[], "R1"),
            Err(PlotError::InsufficientPoints { got: 0, .. })
        ));
    }

    #[test]
    fn empty_canvas_has_no_view_window() {
        let canvas = MapCanvas::new(CanvasOptions::default());
        assert!(matches!(
            canvas.view_window(),
            Err(PlotError::EmptyExtent)
        ));
    }

    #[test]
    fn layer_order_does_not_change_the_extent() {
        let route = [point("R", 1, 2.0, 48.0), point("R", 2, 4.0, 49.0)];
        let trajectory = [point("T", 1, 3.0, 47.0), point("T", 2, 6.0, 50.0)];

        let mut forward = MapCanvas::new(CanvasOptions::default());
        forward.add_route(&route, "R").unwrap();
        forward.add_trajectory(&trajectory, "T", None).unwrap();

        let mut reverse = MapCanvas::new(CanvasOptions::default());
        reverse.add_trajectory(&trajectory, "T", None).unwrap();
        reverse.add_route(&route, "R").unwrap();

        assert_eq!(forward.extent(), reverse.extent());
    }

    #[test]
    fn padding_follows_last_layer_kind() {
        let route = [point("R", 1, 2.0, 48.0), point("R", 2, 4.0, 49.0)];
        let trajectory = [point("T", 1, 2.0, 48.0), point("T", 2, 4.0, 49.0)];

        let mut routes_only = MapCanvas::new(CanvasOptions::default());
        routes_only.add_route(&route, "R").unwrap();
        let route_window = routes_only.view_window().unwrap();

        let mut with_trajectory = MapCanvas::new(CanvasOptions::default());
        with_trajectory.add_route(&route, "R").unwrap();
        with_trajectory
            .add_trajectory(&trajectory, "T", None)
            .unwrap();
        let trajectory_window = with_trajectory.view_window().unwrap();

        // Same extent, wider padding after the trajectory was added.
        assert_eq!(routes_only.extent(), with_trajectory.extent());
        assert!(trajectory_window.width() > route_window.width());
    }

    #[test]
    fn padding_override_beats_layer_kind() {
        let route = [point("R", 1, 2.0, 48.0), point("R", 2, 4.0, 49.0)];
        let options = CanvasOptions {
            padding: Some(0.0),
            ..CanvasOptions::default()
        };
        let mut canvas = MapCanvas::new(options);
        canvas.add_route(&route, "R").unwrap();

        let window = canvas.view_window().unwrap();
        assert_eq!(Some(window), canvas.extent());
    }

    #[test]
    fn airspace_filter_restricts_the_extent() {
        let vertices = [
            vertex("NEAR", 1, 0.0, 50.0),
            vertex("NEAR", 2, 1.0, 50.0),
            vertex("NEAR", 3, 0.5, 51.0),
            vertex("FAR", 1, 20.0, 60.0),
            vertex("FAR", 2, 21.0, 60.0),
            vertex("FAR", 3, 20.5, 61.0),
        ];
        let mut filtered = MapCanvas::new(CanvasOptions::default());
        filtered.add_airspace(&vertices, Some("NEAR")).unwrap();

        let mut near_only = MapCanvas::new(CanvasOptions::default());
        near_only.add_airspace(&vertices[..3], None).unwrap();

        assert_eq!(filtered.extent(), near_only.extent());
    }

    #[test]
    fn single_point_trajectory_is_accepted_and_degenerate() {
        let mut canvas = MapCanvas::new(CanvasOptions::default());
        canvas
            .add_trajectory(&[point("T", 1, 8.5, 47.4)], "T", None)
            .unwrap();
        let window = canvas.view_window().unwrap();
        assert_eq!(window.width(), 0.0);
        assert_eq!(window.height(), 0.0);
    }

    #[test]
    fn renders_a_single_point_trajectory() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("point.png");

        // Degenerate extent: the minimum-span guard, the midpoint label and
        // the legend all have to cope with one point.
        let mut canvas = MapCanvas::new(CanvasOptions::default());
        canvas
            .add_trajectory(&[point("T", 1, 8.5, 47.4)], "T", None)
            .unwrap();

        let fetcher = SolidTileFetcher::new([230, 230, 230, 255]).unwrap();
        canvas.render(&fetcher, &out).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn airspace_polygon_draws_washed_not_opaque() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("airspace.png");

        let options = CanvasOptions {
            basemap: false,
            ..CanvasOptions::default()
        };
        let mut canvas = MapCanvas::new(options);
        canvas
            .add_airspace(
                &[
                    vertex("EGTT", 1, -1.0, 50.5),
                    vertex("EGTT", 2, 1.2, 50.8),
                    vertex("EGTT", 3, 0.5, 52.0),
                ],
                None,
            )
            .unwrap();
        let fetcher = SolidTileFetcher::new([255, 255, 255, 255]).unwrap();
        canvas.render(&fetcher, &out).unwrap();

        // The whole polygon draws at 0.3 alpha over white, so neither the
        // pure fill nor the pure edge colour may appear anywhere.
        let img = image::open(&out).unwrap().to_rgb8();
        let fill = [
            style::AIRSPACE_FILL.0,
            style::AIRSPACE_FILL.1,
            style::AIRSPACE_FILL.2,
        ];
        let edge = [
            style::AIRSPACE_EDGE.0,
            style::AIRSPACE_EDGE.1,
            style::AIRSPACE_EDGE.2,
        ];
        assert!(img.pixels().all(|p| p.0 != fill && p.0 != edge));
    }

    #[test]
    fn render_writes_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("canvas.png");

        let mut canvas = MapCanvas::new(CanvasOptions::default());
        canvas
            .add_airspace(
                &[
                    vertex("EGTT", 1, -1.0, 50.5),
                    vertex("EGTT", 2, 1.2, 50.8),
                    vertex("EGTT", 3, 0.5, 52.0),
                ],
                None,
            )
            .unwrap();
        canvas
            .add_route(
                &[point("R", 1, -0.5, 50.9), point("R", 2, 1.0, 51.5)],
                "R",
            )
            .unwrap();

        let fetcher = SolidTileFetcher::new([230, 230, 230, 255]).unwrap();
        canvas.render(&fetcher, &out).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
