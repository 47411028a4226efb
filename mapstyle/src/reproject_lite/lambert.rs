//! Conique conforme de Lambert à deux parallèles (Lambert 93, EPSG:2154)

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use anyhow::{bail, Result};

use super::ellipsoid::Ellipsoid;
use super::Geographic;

/// Définition d'une conique conforme sécante (angles en degrés)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConicConformal {
    pub name: &'static str,
    pub lon0: f64,
    pub lat0: f64,
    pub lat1: f64,
    pub lat2: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

/// RGF93 / Lambert-93: méridien 3°E, parallèles 44°N et 49°N
pub const LAMBERT_93: ConicConformal = ConicConformal {
    name: "Lambert 93",
    lon0: 3.0,
    lat0: 46.5,
    lat1: 44.0,
    lat2: 49.0,
    false_easting: 700_000.0,
    false_northing: 6_600_000.0,
};

/// Grandeurs du cône pour un ellipsoïde donné
struct Cone {
    n: f64,
    c: f64,
    rho0: f64,
    e: f64,
}

impl ConicConformal {
    fn cone(&self, ellipsoid: &Ellipsoid) -> Cone {
        let e = ellipsoid.e();
        let (phi0, phi1, phi2) = (
            self.lat0.to_radians(),
            self.lat1.to_radians(),
            self.lat2.to_radians(),
        );

        // m = N(phi) cos(phi), rayon du parallèle
        let m1 = ellipsoid.prime_vertical_radius(phi1) * phi1.cos();
        let m2 = ellipsoid.prime_vertical_radius(phi2) * phi2.cos();
        let l1 = isometric_latitude(phi1, e);
        let l2 = isometric_latitude(phi2, e);

        let n = (m1.ln() - m2.ln()) / (l2 - l1);
        let c = m1 / n * (n * l1).exp();
        let rho0 = c * (-n * isometric_latitude(phi0, e)).exp();

        Cone { n, c, rho0, e }
    }

    /// Géographique → (x, y)
    pub fn forward(&self, geo: Geographic, ellipsoid: &Ellipsoid) -> Result<(f64, f64)> {
        if geo.lat.abs() >= FRAC_PI_2 {
            bail!("{}: latitude hors domaine ({})", self.name, geo.lat.to_degrees());
        }

        let cone = self.cone(ellipsoid);
        let rho = cone.c * (-cone.n * isometric_latitude(geo.lat, cone.e)).exp();
        let theta = cone.n * (geo.lon - self.lon0.to_radians());

        Ok((
            self.false_easting + rho * theta.sin(),
            self.false_northing + cone.rho0 - rho * theta.cos(),
        ))
    }

    /// (x, y) → géographique
    pub fn inverse(&self, x: f64, y: f64, ellipsoid: &Ellipsoid) -> Result<Geographic> {
        let cone = self.cone(ellipsoid);
        let dx = x - self.false_easting;
        let dy = cone.rho0 - (y - self.false_northing);

        let rho = dx.hypot(dy).copysign(cone.n);
        if rho == 0.0 {
            bail!("{}: point au sommet du cône ({}, {})", self.name, x, y);
        }

        let theta = (dx / dy).atan();
        let lat = latitude_from_isometric(-(rho / cone.c).ln() / cone.n, cone.e);
        let lon = self.lon0.to_radians() + theta / cone.n;

        Ok(Geographic::new(lon, lat))
    }
}

/// Latitude isométrique L(phi)
fn isometric_latitude(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    (FRAC_PI_4 + phi / 2.0).tan().ln() + e / 2.0 * ((1.0 - es) / (1.0 + es)).ln()
}

/// Inverse de L par point fixe
fn latitude_from_isometric(l: f64, e: f64) -> f64 {
    let exp_l = l.exp();
    let mut phi = 2.0 * exp_l.atan() - FRAC_PI_2;

    for _ in 0..16 {
        let es = e * phi.sin();
        let next = 2.0 * (exp_l * ((1.0 + es) / (1.0 - es)).powf(e / 2.0)).atan() - FRAC_PI_2;
        if (next - phi).abs() < 1e-12 {
            return next;
        }
        phi = next;
    }
    phi
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_l93(lon: f64, lat: f64) -> (f64, f64) {
        LAMBERT_93
            .forward(Geographic::from_degrees(lon, lat), &Ellipsoid::GRS80)
            .unwrap()
    }

    fn from_l93(x: f64, y: f64) -> (f64, f64) {
        LAMBERT_93
            .inverse(x, y, &Ellipsoid::GRS80)
            .unwrap()
            .to_degrees()
    }

    #[test]
    fn test_eiffel_tower() {
        let (lon, lat) = from_l93(648237.0, 6862107.0);
        assert!((lon - 2.2945).abs() < 0.01, "lon={}", lon);
        assert!((lat - 48.8584).abs() < 0.01, "lat={}", lat);
    }

    #[test]
    fn test_south_of_france() {
        let (lon, lat) = from_l93(893193.0, 6245829.0);
        assert!((lon - 5.37).abs() < 0.1, "lon={}", lon);
        assert!((lat - 43.30).abs() < 0.1, "lat={}", lat);
    }

    #[test]
    fn test_origin_maps_to_false_origin() {
        let (x, y) = to_l93(3.0, 46.5);
        assert!((x - 700000.0).abs() < 1e-6, "x={}", x);
        assert!((y - 6600000.0).abs() < 1e-6, "y={}", y);
    }

    #[test]
    fn test_roundtrip() {
        let (x, y) = to_l93(-4.48, 48.39);
        let (lon, lat) = from_l93(x, y);
        assert!((lon + 4.48).abs() < 1e-9, "lon={}", lon);
        assert!((lat - 48.39).abs() < 1e-9, "lat={}", lat);
    }

    #[test]
    fn test_pole_rejected() {
        assert!(LAMBERT_93
            .forward(Geographic::from_degrees(3.0, 90.0), &Ellipsoid::GRS80)
            .is_err());
    }
}
