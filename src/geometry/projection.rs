use std::f64::consts::PI;

use crate::error::PlotError;

/// EPSG code for geographic WGS84 (longitude/latitude in degrees).
pub const WGS84: i32 = 4326;
/// EPSG code for spherical Web Mercator (projected metres).
pub const WEB_MERCATOR: i32 = 3857;

/// WebMercator constants
const R_MAJOR: f64 = 6378137.0;
const MAX_LAT: f64 = 85.05112877980659; // Max bounds for Web Mercator

/// from longitude, latitude (degrees) → Web Mercator (x, y in meters)
pub fn lon_lat_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    // clamp latitude into Mercator's valid range
    let clamped_lat = lat.clamp(-MAX_LAT, MAX_LAT);

    let x = lon * R_MAJOR * PI / 180.0;
    let lat_rad = clamped_lat * PI / 180.0;
    let y = R_MAJOR * ((PI / 4.0 + lat_rad / 2.0).tan().ln());
    (x, y)
}

/// from Web Mercator (x, y in meters) → longitude, latitude (degrees)
pub fn mercator_to_lon_lat(x: f64, y: f64) -> (f64, f64) {
    let lon = x / (R_MAJOR * PI / 180.0);
    let lat_rad = 2.0 * ((y / R_MAJOR).exp().atan()) - PI / 2.0;
    let lat = lat_rad * 180.0 / PI;
    (lon, lat)
}

/// Projects one point between coordinate reference systems.
///
/// The WGS84 ↔ Web Mercator pairs used by every plot run through the
/// closed-form spherical formulas above; any other pair falls back to PROJ.
pub fn project_point(
    x: f64,
    y: f64,
    from_crs: i32,
    to_crs: i32,
) -> Result<(f64, f64), PlotError> {
    // no work if same
    if from_crs == to_crs {
        return Ok((x, y));
    }

    match (from_crs, to_crs) {
        (WGS84, WEB_MERCATOR) => Ok(lon_lat_to_mercator(x, y)),
        (WEB_MERCATOR, WGS84) => Ok(mercator_to_lon_lat(x, y)),
        // any other CRS: fall back to PROJ
        _ => {
            let proj = proj::Proj::new_known_crs(
                format!("EPSG:{from_crs}").as_str(),
                format!("EPSG:{to_crs}").as_str(),
                None,
            )
            .map_err(|e| PlotError::Projection {
                from_crs,
                to_crs,
                reason: e.to_string(),
            })?;
            proj.convert((x, y)).map_err(|e| PlotError::Projection {
                from_crs,
                to_crs,
                reason: e.to_string(),
            })
        }
    }
}

/// Projects a lon/lat path into Web Mercator metres.
pub fn path_to_mercator<I>(points: I) -> Vec<(f64, f64)>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    points
        .into_iter()
        .map(|(lon, lat)| lon_lat_to_mercator(lon, lat))
        .collect()
}
