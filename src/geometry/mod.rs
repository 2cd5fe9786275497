pub mod projection;

/// Area-weighted centroid of a polygon ring (shoelace formula).
///
/// Rings with vanishing signed area (collinear or repeated vertices) fall
/// back to the vertex mean. Returns `None` for an empty ring.
pub fn ring_centroid(ring: &[(f64, f64)]) -> Option<(f64, f64)> {
    if ring.is_empty() {
        return None;
    }

    let n = ring.len();
    let mut area2 = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let (x0, y0) = ring[i];
        let (x1, y1) = ring[(i + 1) % n];
        let cross = x0 * y1 - x1 * y0;
        area2 += cross;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }

    if area2.abs() < 1e-9 {
        let (sx, sy) = ring
            .iter()
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        return Some((sx / n as f64, sy / n as f64));
    }
    Some((cx / (3.0 * area2), cy / (3.0 * area2)))
}

/// Point halfway along a polyline by arc length.
///
/// A single point, or a path whose total length is zero, yields the first
/// point. Returns `None` for an empty path.
pub fn path_midpoint(path: &[(f64, f64)]) -> Option<(f64, f64)> {
    let (&first, rest) = path.split_first()?;

    let mut total = 0.0;
    let mut prev = first;
    for &p in rest {
        total += dist(prev, p);
        prev = p;
    }
    if total == 0.0 {
        return Some(first);
    }

    let mut remaining = total / 2.0;
    let mut prev = first;
    for &p in rest {
        let seg = dist(prev, p);
        if seg >= remaining && seg > 0.0 {
            let t = remaining / seg;
            return Some((prev.0 + (p.0 - prev.0) * t, prev.1 + (p.1 - prev.1) * t));
        }
        remaining -= seg;
        prev = p;
    }
    Some(prev)
}

fn dist(a: (f64, f64), b: (f64, f64)) -> f64 {
    (b.0 - a.0).hypot(b.1 - a.1)
}
