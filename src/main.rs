use std::io;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use tracing_subscriber::EnvFilter;

use aeroplot::basemap::http::HttpTileFetcher;
use aeroplot::basemap::{SolidTileFetcher, TileFetcher, TileProvider};
use aeroplot::canvas::MapCanvas;
use aeroplot::config::{self, CanvasOptions};
use aeroplot::dataset::{self, AirspaceVertex, FlightEvent, FlightPathPoint, FlightRecord};
use aeroplot::figures;
use aeroplot::style;
use aeroplot::utils::summary;

/// Background colour for offline rendering, same grey as missing tiles.
const OFFLINE_TILE_RGBA: [u8; 4] = [238, 238, 238, 255];

#[derive(Parser, Debug)]
#[command(author, version, about = "Render map figures from EUROCONTROL R&D archive exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render airspace boundary polygons from a vertices export
    Airspace(AirspaceArgs),
    /// Render filed routes from a route-points export
    Route(RouteArgs),
    /// Render flown trajectories from a trajectory-points export
    Trajectory(TrajectoryArgs),
    /// Render the map and altitude profile of one flight's events
    Events(EventsArgs),
    /// Render the hourly departure/arrival histogram for one airport
    Histogram(HistogramArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Output PNG path
    #[arg(short, long, default_value = "figure.png", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Figure width in pixels (defaults per figure kind)
    #[arg(long)]
    width: Option<u32>,

    /// Figure height in pixels (defaults per figure kind)
    #[arg(long)]
    height: Option<u32>,

    /// Figure title override
    #[arg(long)]
    title: Option<String>,

    /// View padding as a fraction of the extent span
    #[arg(long)]
    padding: Option<f64>,

    /// Basemap tile provider
    #[arg(long, value_enum)]
    provider: Option<ProviderOpt>,

    /// Use a flat tile background instead of fetching over the network
    #[arg(long, action = ArgAction::SetTrue)]
    offline: bool,

    /// Skip the basemap entirely
    #[arg(long, action = ArgAction::SetTrue)]
    no_basemap: bool,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

impl RenderArgs {
    fn canvas_options(&self, default_size: (u32, u32)) -> CanvasOptions {
        CanvasOptions {
            width: self.width.unwrap_or(default_size.0),
            height: self.height.unwrap_or(default_size.1),
            title: self.title.clone(),
            padding: self.padding,
            provider: self.provider.map(ProviderOpt::provider),
            basemap: !self.no_basemap,
        }
    }

    fn fetcher(&self) -> Result<Box<dyn TileFetcher>> {
        if self.offline {
            Ok(Box::new(SolidTileFetcher::new(OFFLINE_TILE_RGBA)?))
        } else {
            Ok(Box::new(HttpTileFetcher::new()?))
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ProviderOpt {
    /// CARTO Positron, light grey
    Positron,
    /// OpenStreetMap Mapnik
    Osm,
}

impl ProviderOpt {
    fn provider(self) -> TileProvider {
        match self {
            ProviderOpt::Positron => TileProvider::positron(),
            ProviderOpt::Osm => TileProvider::mapnik(),
        }
    }
}

#[derive(Parser, Debug)]
struct AirspaceArgs {
    /// Airspace vertices CSV
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    vertices: PathBuf,

    /// Airspace to draw (all of them when omitted)
    #[arg(long)]
    id: Option<String>,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Parser, Debug)]
struct RouteArgs {
    /// Route points CSV
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    routes: PathBuf,

    /// Flight to draw (all of them when omitted)
    #[arg(long)]
    id: Option<String>,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Parser, Debug)]
struct TrajectoryArgs {
    /// Trajectory points CSV
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    trajectories: PathBuf,

    /// Flight to draw (all of them when omitted)
    #[arg(long)]
    id: Option<String>,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Parser, Debug)]
struct EventsArgs {
    /// Flight events CSV
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    events: PathBuf,

    /// Flight to plot
    #[arg(long)]
    id: String,

    #[command(flatten)]
    render: RenderArgs,
}

#[derive(Parser, Debug)]
struct HistogramArgs {
    /// Flight list CSV with filed and actual schedule times
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    flights: PathBuf,

    /// Airport to bin departures and arrivals for
    #[arg(long)]
    airport: String,

    #[command(flatten)]
    render: RenderArgs,
}

impl Cli {
    fn verbose(&self) -> bool {
        match &self.command {
            Command::Airspace(args) => args.render.verbose,
            Command::Route(args) => args.render.verbose,
            Command::Trajectory(args) => args.render.verbose,
            Command::Events(args) => args.render.verbose,
            Command::Histogram(args) => args.render.verbose,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose() { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Airspace(args) => handle_airspace(args),
        Command::Route(args) => handle_route(args),
        Command::Trajectory(args) => handle_trajectory(args),
        Command::Events(args) => handle_events(args),
        Command::Histogram(args) => handle_histogram(args),
    }
}

fn handle_airspace(args: AirspaceArgs) -> Result<()> {
    let vertices: Vec<AirspaceVertex> = dataset::load_csv(&args.vertices)?;
    if vertices.is_empty() {
        bail!("{} contains no rows", args.vertices.display());
    }
    summary::print_airspace_summary(&vertices);

    let mut canvas = MapCanvas::new(args.render.canvas_options(config::MAP_FIGURE_SIZE));
    match &args.id {
        Some(id) => canvas.add_airspace(&vertices, Some(id))?,
        None => {
            for id in dataset::distinct_ids(&vertices, |v| v.airspace_id.as_str()) {
                canvas.add_airspace(&vertices, Some(&id))?;
            }
        }
    }

    let fetcher = args.render.fetcher()?;
    canvas.render(&*fetcher, &args.render.output)?;
    Ok(())
}

fn handle_route(args: RouteArgs) -> Result<()> {
    let points: Vec<FlightPathPoint> = dataset::load_csv(&args.routes)?;
    if points.is_empty() {
        bail!("{} contains no rows", args.routes.display());
    }
    summary::print_path_summary(&points, "Route");

    let mut canvas = MapCanvas::new(args.render.canvas_options(config::MAP_FIGURE_SIZE));
    for id in selected_ids(&args.id, &points) {
        let path = owned_path(&points, &id);
        if path.is_empty() {
            bail!("no points for flight {} in {}", id, args.routes.display());
        }
        canvas.add_route(&path, &id)?;
    }

    let fetcher = args.render.fetcher()?;
    canvas.render(&*fetcher, &args.render.output)?;
    Ok(())
}

fn handle_trajectory(args: TrajectoryArgs) -> Result<()> {
    let points: Vec<FlightPathPoint> = dataset::load_csv(&args.trajectories)?;
    if points.is_empty() {
        bail!("{} contains no rows", args.trajectories.display());
    }
    summary::print_path_summary(&points, "Trajectory");

    let mut canvas = MapCanvas::new(args.render.canvas_options(config::TRAJECTORY_FIGURE_SIZE));
    for (i, id) in selected_ids(&args.id, &points).iter().enumerate() {
        let path = owned_path(&points, id);
        if path.is_empty() {
            bail!("no points for flight {} in {}", id, args.trajectories.display());
        }
        let color = style::TRAJECTORY_PALETTE[i % style::TRAJECTORY_PALETTE.len()];
        canvas.add_trajectory(&path, id, Some(color))?;
    }

    let fetcher = args.render.fetcher()?;
    canvas.render(&*fetcher, &args.render.output)?;
    Ok(())
}

fn handle_events(args: EventsArgs) -> Result<()> {
    let events: Vec<FlightEvent> = dataset::load_csv(&args.events)?;
    if events.is_empty() {
        bail!("{} contains no rows", args.events.display());
    }
    summary::print_event_summary(&events);

    let options = args.render.canvas_options(config::EVENT_FIGURE_SIZE);
    let fetcher = args.render.fetcher()?;
    figures::render_flight_events(&events, &args.id, &*fetcher, &args.render.output, &options)?;
    Ok(())
}

fn handle_histogram(args: HistogramArgs) -> Result<()> {
    let flights: Vec<FlightRecord> = dataset::load_csv(&args.flights)?;
    if flights.is_empty() {
        bail!("{} contains no rows", args.flights.display());
    }
    summary::print_flight_summary(&flights);

    let options = args.render.canvas_options(config::HISTOGRAM_FIGURE_SIZE);
    figures::render_hourly_histogram(&flights, &args.airport, &args.render.output, &options)?;
    Ok(())
}

fn selected_ids(requested: &Option<String>, points: &[FlightPathPoint]) -> Vec<String> {
    match requested {
        Some(id) => vec![id.clone()],
        None => dataset::distinct_ids(points, |p| p.ectrl_id.as_str()),
    }
}

fn owned_path(points: &[FlightPathPoint], id: &str) -> Vec<FlightPathPoint> {
    dataset::path_for_flight(points, id)
        .into_iter()
        .cloned()
        .collect()
}
