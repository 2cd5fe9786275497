//! Basemap tile providers and window mosaics.
//!
//! A figure's basemap is assembled once per render: pick a zoom level for
//! the view window, fetch the covering tiles through a [`TileFetcher`],
//! stitch them, then crop and resample to the plot area.

use std::io::Cursor;

use image::{ColorType, ImageEncoder, Rgba, RgbaImage, codecs::png::PngEncoder, imageops};

use crate::error::PlotError;
use crate::extent::BoundingBox;
use slippy::{TILE_SIZE, resolution, tile_bounds, tile_range, zoom_for_window};

pub mod http;
pub mod slippy;

/// An XYZ raster tile source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileProvider {
    pub name: &'static str,
    url_template: &'static str,
    subdomains: &'static [&'static str],
    pub attribution: &'static str,
    pub max_zoom: u8,
}

impl TileProvider {
    /// CARTO Positron, the light grey default used by most figures.
    pub fn positron() -> Self {
        TileProvider {
            name: "carto-positron",
            url_template: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}.png",
            subdomains: &["a", "b", "c", "d"],
            attribution: "© OpenStreetMap contributors © CARTO",
            max_zoom: 20,
        }
    }

    /// OpenStreetMap's standard Mapnik rendering, used for route figures.
    pub fn mapnik() -> Self {
        TileProvider {
            name: "osm-mapnik",
            url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            subdomains: &["a", "b", "c"],
            attribution: "© OpenStreetMap contributors",
            max_zoom: 19,
        }
    }

    /// Concrete URL for one tile, rotating across the provider's subdomains.
    pub fn tile_url(&self, z: u8, x: u32, y: u32) -> String {
        let s = self.subdomains[(x + y) as usize % self.subdomains.len()];
        self.url_template
            .replace("{s}", s)
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

/// Source of encoded tile images.
///
/// The HTTP fetcher is the production path; offline runs and tests plug in
/// [`SolidTileFetcher`] so rendering never touches the network.
pub trait TileFetcher {
    fn fetch_tile(
        &self,
        provider: &TileProvider,
        z: u8,
        x: u32,
        y: u32,
    ) -> Result<Vec<u8>, PlotError>;
}

/// Serves one pre-encoded solid-colour PNG for every tile.
pub struct SolidTileFetcher {
    png: Vec<u8>,
}

impl SolidTileFetcher {
    pub fn new(rgba: [u8; 4]) -> Result<Self, PlotError> {
        let tile = RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgba(rgba));
        let mut png = Vec::new();
        PngEncoder::new(Cursor::new(&mut png))
            .write_image(tile.as_raw(), TILE_SIZE, TILE_SIZE, ColorType::Rgba8.into())
            .map_err(|e| PlotError::TileFetch {
                url: "builtin:solid".to_string(),
                reason: e.to_string(),
            })?;
        Ok(SolidTileFetcher { png })
    }
}

impl TileFetcher for SolidTileFetcher {
    fn fetch_tile(
        &self,
        _provider: &TileProvider,
        _z: u8,
        _x: u32,
        _y: u32,
    ) -> Result<Vec<u8>, PlotError> {
        Ok(self.png.clone())
    }
}

/// Fetches and stitches the tiles covering `window`, cropped to the window
/// and resampled to `target` pixels.
pub fn window_mosaic(
    fetcher: &dyn TileFetcher,
    provider: &TileProvider,
    window: &BoundingBox,
    target: (u32, u32),
) -> Result<RgbaImage, PlotError> {
    let z = zoom_for_window(window, target, provider.max_zoom);
    let (xs, ys) = tile_range(window, z);
    let (x0, y0) = (*xs.start(), *ys.start());
    let cols = xs.end() - x0 + 1;
    let rows = ys.end() - y0 + 1;
    tracing::debug!(
        provider = provider.name,
        z,
        cols,
        rows,
        "fetching basemap tiles"
    );

    let mut mosaic = RgbaImage::from_pixel(
        cols * TILE_SIZE,
        rows * TILE_SIZE,
        Rgba([238, 238, 238, 255]),
    );
    for ty in ys.clone() {
        for tx in xs.clone() {
            let bytes = fetcher.fetch_tile(provider, z, tx, ty)?;
            let tile = image::load_from_memory(&bytes)
                .map_err(|e| PlotError::TileFetch {
                    url: provider.tile_url(z, tx, ty),
                    reason: format!("decode failed: {e}"),
                })?
                .to_rgba8();
            imageops::replace(
                &mut mosaic,
                &tile,
                i64::from((tx - x0) * TILE_SIZE),
                i64::from((ty - y0) * TILE_SIZE),
            );
        }
    }

    // Crop the window out of the mosaic, then resample to the plot area.
    // Clamping covers windows that stick out past the world edge, where the
    // fetched tile range is smaller than the window.
    let res = resolution(z);
    let (west, _, _, north) = tile_bounds(z, x0, y0);
    let mut px = ((window.x_min() - west) / res).round().max(0.0) as u32;
    let mut py = ((north - window.y_max()) / res).round().max(0.0) as u32;
    px = px.min(mosaic.width() - 1);
    py = py.min(mosaic.height() - 1);
    let pw = (((window.width() / res).round() as u32).max(1)).min(mosaic.width() - px);
    let ph = (((window.height() / res).round() as u32).max(1)).min(mosaic.height() - py);

    let cropped = imageops::crop_imm(&mosaic, px, py, pw, ph).to_image();
    Ok(imageops::resize(
        &cropped,
        target.0.max(1),
        target.1.max(1),
        imageops::FilterType::Triangle,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::projection::lon_lat_to_mercator;

    #[test]
    fn tile_urls_fill_template_and_rotate_subdomains() {
        let positron = TileProvider::positron();
        assert_eq!(
            positron.tile_url(3, 1, 2),
            "https://d.basemaps.cartocdn.com/light_all/3/1/2.png"
        );
        let mapnik = TileProvider::mapnik();
        assert_eq!(
            mapnik.tile_url(10, 531, 360),
            "https://a.tile.openstreetmap.org/10/531/360.png"
        );
        assert_eq!(
            mapnik.tile_url(10, 531, 362),
            "https://c.tile.openstreetmap.org/10/531/362.png"
        );
        // Same tile, same subdomain: URL choice is deterministic.
        assert_eq!(mapnik.tile_url(10, 531, 360), mapnik.tile_url(10, 531, 360));
    }

    #[test]
    fn solid_fetcher_serves_a_decodable_tile() {
        let fetcher = SolidTileFetcher::new([10, 20, 30, 255]).unwrap();
        let bytes = fetcher
            .fetch_tile(&TileProvider::positron(), 5, 1, 1)
            .unwrap();
        let img = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (TILE_SIZE, TILE_SIZE));
        assert_eq!(img.get_pixel(100, 200).0, [10, 20, 30, 255]);
    }

    #[test]
    fn mosaic_matches_target_dimensions_and_fill() {
        let fetcher = SolidTileFetcher::new([200, 210, 220, 255]).unwrap();
        let (x0, y0) = lon_lat_to_mercator(8.5, 47.3);
        let (x1, y1) = lon_lat_to_mercator(8.7, 47.5);
        let window = BoundingBox::new(x0, x1, y0, y1).unwrap();

        let mosaic =
            window_mosaic(&fetcher, &TileProvider::positron(), &window, (120, 90)).unwrap();
        assert_eq!(mosaic.dimensions(), (120, 90));
        assert_eq!(mosaic.get_pixel(60, 45).0, [200, 210, 220, 255]);
        assert_eq!(mosaic.get_pixel(0, 0).0, [200, 210, 220, 255]);
    }

    #[test]
    fn mosaic_tolerates_window_past_the_world_edge() {
        let fetcher = SolidTileFetcher::new([5, 5, 5, 255]).unwrap();
        let half = slippy::WORLD_HALF_SPAN;
        let window = BoundingBox::new(half * 0.9, half * 1.1, half * 0.9, half * 1.1).unwrap();

        let mosaic = window_mosaic(&fetcher, &TileProvider::mapnik(), &window, (64, 64)).unwrap();
        assert_eq!(mosaic.dimensions(), (64, 64));
    }
}
