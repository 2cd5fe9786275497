//! Slippy-map tile arithmetic in Web Mercator.
//!
//! https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames

use std::ops::RangeInclusive;

use crate::extent::BoundingBox;

/// Tile edge length in pixels.
pub const TILE_SIZE: u32 = 256;
/// Half-extent of the Web Mercator world square, in metres.
pub const WORLD_HALF_SPAN: f64 = 20037508.342789244;

/// Metres per pixel at zoom `z`.
pub fn resolution(z: u8) -> f64 {
    let initial_resolution = 2.0 * WORLD_HALF_SPAN / TILE_SIZE as f64;
    initial_resolution / 2f64.powi(z as i32)
}

/// Web Mercator bounds of one tile as `(minx, miny, maxx, maxy)`.
pub fn tile_bounds(z: u8, x: u32, y: u32) -> (f64, f64, f64, f64) {
    let res = resolution(z);
    let tile_span = TILE_SIZE as f64 * res;
    let minx = x as f64 * tile_span - WORLD_HALF_SPAN;
    let maxx = (x as f64 + 1.0) * tile_span - WORLD_HALF_SPAN;
    let maxy = WORLD_HALF_SPAN - y as f64 * tile_span;
    let miny = WORLD_HALF_SPAN - (y as f64 + 1.0) * tile_span;
    (minx, miny, maxx, maxy)
}

fn tile_count(z: u8) -> u32 {
    1u32 << z
}

/// Tile column/row containing a Web Mercator point, clamped into the world.
pub fn tile_index(z: u8, x_m: f64, y_m: f64) -> (u32, u32) {
    let tile_span = TILE_SIZE as f64 * resolution(z);
    let max = (tile_count(z) - 1) as f64;
    let tx = ((x_m + WORLD_HALF_SPAN) / tile_span).floor().clamp(0.0, max);
    let ty = ((WORLD_HALF_SPAN - y_m) / tile_span).floor().clamp(0.0, max);
    (tx as u32, ty as u32)
}

/// Inclusive column and row ranges covering a window at zoom `z`.
pub fn tile_range(window: &BoundingBox, z: u8) -> (RangeInclusive<u32>, RangeInclusive<u32>) {
    // Rows count from the north edge, so the window's y_max is the first row.
    let (x0, y0) = tile_index(z, window.x_min(), window.y_max());
    let (x1, y1) = tile_index(z, window.x_max(), window.y_min());
    (x0..=x1, y0..=y1)
}

/// Smallest zoom whose resolution meets the window's pixel density, capped
/// at the provider maximum.
pub fn zoom_for_window(window: &BoundingBox, target: (u32, u32), max_zoom: u8) -> u8 {
    let needed = (window.width() / target.0.max(1) as f64)
        .max(window.height() / target.1.max(1) as f64);
    for z in 0..=max_zoom {
        if resolution(z) <= needed {
            return z;
        }
    }
    max_zoom
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const EPS: f64 = 1e-6;
    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn zoom_zero_tile_covers_the_world() {
        let (minx, miny, maxx, maxy) = tile_bounds(0, 0, 0);
        assert!(approx_eq(minx, -WORLD_HALF_SPAN));
        assert!(approx_eq(miny, -WORLD_HALF_SPAN));
        assert!(approx_eq(maxx, WORLD_HALF_SPAN));
        assert!(approx_eq(maxy, WORLD_HALF_SPAN));
    }

    #[test]
    fn zoom_one_quadrants_meet_at_origin() {
        let (minx, miny, maxx, maxy) = tile_bounds(1, 1, 0);
        assert!(approx_eq(minx, 0.0));
        assert!(approx_eq(miny, 0.0));
        assert!(approx_eq(maxx, WORLD_HALF_SPAN));
        assert!(approx_eq(maxy, WORLD_HALF_SPAN));
    }

    #[test]
    fn resolution_halves_per_zoom_level() {
        for z in 0..18 {
            assert!(approx_eq(resolution(z + 1), resolution(z) / 2.0));
        }
    }

    #[test]
    fn random_tile_centers_round_trip() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let z = rng.random_range(1..16u8);
            let x = rng.random_range(0..tile_count(z));
            let y = rng.random_range(0..tile_count(z));

            let (minx, miny, maxx, maxy) = tile_bounds(z, x, y);
            let cx = (minx + maxx) / 2.0;
            let cy = (miny + maxy) / 2.0;
            assert_eq!(tile_index(z, cx, cy), (x, y), "z={z} x={x} y={y}");
        }
    }

    #[test]
    fn tile_index_clamps_outside_the_world() {
        let far = WORLD_HALF_SPAN * 3.0;
        assert_eq!(tile_index(2, -far, far), (0, 0));
        assert_eq!(tile_index(2, far, -far), (3, 3));
    }

    #[test]
    fn tile_range_spans_the_window() {
        // A window straddling the origin touches all four z=1 quadrants.
        let window = BoundingBox::new(-10_000.0, 10_000.0, -10_000.0, 10_000.0).unwrap();
        let (xs, ys) = tile_range(&window, 1);
        assert_eq!(xs, 0..=1);
        assert_eq!(ys, 0..=1);

        // A window inside one tile needs exactly that tile.
        let small = BoundingBox::new(1_000.0, 2_000.0, 1_000.0, 2_000.0).unwrap();
        let (xs, ys) = tile_range(&small, 1);
        assert_eq!(xs, 1..=1);
        assert_eq!(ys, 0..=0);
    }

    #[test]
    fn zoom_picks_first_sufficient_resolution() {
        let world =
            BoundingBox::new(-WORLD_HALF_SPAN, WORLD_HALF_SPAN, -WORLD_HALF_SPAN, WORLD_HALF_SPAN)
                .unwrap();
        assert_eq!(zoom_for_window(&world, (TILE_SIZE, TILE_SIZE), 19), 0);

        // A ~10 km window on an 800 px canvas wants sub-13 m/px resolution.
        let city = BoundingBox::new(0.0, 10_000.0, 0.0, 10_000.0).unwrap();
        let z = zoom_for_window(&city, (800, 800), 19);
        assert!(resolution(z) <= 10_000.0 / 800.0);
        assert!(resolution(z - 1) > 10_000.0 / 800.0);
    }

    #[test]
    fn zoom_respects_provider_cap() {
        let tiny = BoundingBox::new(0.0, 10.0, 0.0, 10.0).unwrap();
        assert_eq!(zoom_for_window(&tiny, (800, 800), 12), 12);
    }
}
