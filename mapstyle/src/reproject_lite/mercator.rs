//! Web Mercator (EPSG:3857), sphère de rayon a(WGS84)

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use anyhow::{bail, Result};

use super::ellipsoid::Ellipsoid;
use super::Geographic;

/// Latitude limite du carré Web Mercator (degrés)
pub const MAX_LAT: f64 = 85.05112877980659;

const RADIUS: f64 = Ellipsoid::WGS84.a;

/// Géographique → (x, y); les latitudes au-delà de [`MAX_LAT`] sont ramenées au bord
pub fn forward(geo: Geographic) -> Result<(f64, f64)> {
    let limit = MAX_LAT.to_radians();
    let lat = geo.lat.clamp(-limit, limit);

    Ok((RADIUS * geo.lon, RADIUS * (FRAC_PI_4 + lat / 2.0).tan().ln()))
}

/// (x, y) → géographique
pub fn inverse(x: f64, y: f64) -> Result<Geographic> {
    let lat = 2.0 * (y / RADIUS).exp().atan() - FRAC_PI_2;
    if !lat.is_finite() {
        bail!("Web Mercator: y hors domaine ({})", y);
    }
    Ok(Geographic::new(x / RADIUS, lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_known_point() {
        let (x, y) = forward(Geographic::from_degrees(2.35, 48.85)).unwrap();
        assert!((x - 261600.0).abs() < 1000.0, "x={}", x);
        assert!((y - 6250000.0).abs() < 10000.0, "y={}", y);
    }

    #[test]
    fn test_square_corner() {
        let (x, y) = forward(Geographic::from_degrees(180.0, 90.0)).unwrap();
        assert!((x - 20037508.342789244).abs() < 1e-6, "x={}", x);
        assert!((y - 20037508.342789244).abs() < 1e-3, "y={}", y);
    }

    #[test]
    fn test_inverse() {
        let (lon, lat) = inverse(-8238310.24, 4970071.58).unwrap().to_degrees();
        // New York
        assert!((lon + 74.006).abs() < 1e-3, "lon={}", lon);
        assert!((lat - 40.7128).abs() < 1e-3, "lat={}", lat);
    }
}
