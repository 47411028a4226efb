//! Projection UTM (Universal Transverse Mercator)
//!
//! Zones enregistrées:
//! - Zone 20N (EPSG:32620) - Martinique, Guadeloupe
//! - Zone 22N (EPSG:32622) - Guyane
//! - Zone 30N (EPSG:25830, ETRS89) - Espagne
//! - Zone 33N (EPSG:32633) - Europe centrale
//! - Zone 38S (EPSG:32738) - Mayotte
//! - Zone 40S (EPSG:32740) - Réunion

use super::ellipsoid::Ellipsoid;
use super::Geographic;
use anyhow::{bail, Result};

/// Facteur d'échelle
const K0: f64 = 0.9996;
/// False easting
const X0: f64 = 500000.0;
/// False northing des zones sud
const Y0_SOUTH: f64 = 10000000.0;

/// Longitude centrale de la zone (radians)
fn central_meridian(zone: u8) -> f64 {
    ((zone as f64 - 1.0) * 6.0 - 180.0 + 3.0).to_radians()
}

/// Distance méridienne depuis l'équateur
fn meridian_arc(lat: f64, a: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    a * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
}

/// Convertit UTM vers coordonnées géographiques
pub fn utm_to_geographic(
    x: f64,
    y: f64,
    zone: u8,
    south: bool,
    ellipsoid: &Ellipsoid,
) -> Result<Geographic> {
    let a = ellipsoid.a;
    let e2 = ellipsoid.e2();
    let ep2 = ellipsoid.ep2();

    let y0 = if south { Y0_SOUTH } else { 0.0 };
    let lon0 = central_meridian(zone);

    // Coordonnées réduites
    let x = x - X0;
    let y = y - y0;

    // Calcul du footprint latitude
    let m = y / K0;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));

    // Coefficients pour la série
    let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    if phi1.abs() >= std::f64::consts::FRAC_PI_2 {
        bail!("UTM {}: northing hors domaine ({})", zone, y);
    }

    // Calculs intermédiaires
    let sin_phi1 = phi1.sin();
    let cos_phi1 = phi1.cos();
    let tan_phi1 = phi1.tan();

    let n1 = a / (1.0 - e2 * sin_phi1.powi(2)).sqrt();
    let t1 = tan_phi1.powi(2);
    let c1 = ep2 * cos_phi1.powi(2);
    let r1 = a * (1.0 - e2) / (1.0 - e2 * sin_phi1.powi(2)).powf(1.5);
    let d = x / (n1 * K0);

    let lat = phi1
        - (n1 * tan_phi1 / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1.powi(2) - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1.powi(2)
                    - 252.0 * ep2
                    - 3.0 * c1.powi(2))
                    * d.powi(6)
                    / 720.0);

    let lon = lon0
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1.powi(2) + 8.0 * ep2 + 24.0 * t1.powi(2))
                * d.powi(5)
                / 120.0)
            / cos_phi1;

    Ok(Geographic::new(lon, lat))
}

/// Convertit des coordonnées géographiques vers UTM
pub fn geographic_to_utm(
    geo: Geographic,
    zone: u8,
    south: bool,
    ellipsoid: &Ellipsoid,
) -> Result<(f64, f64)> {
    let lon0 = central_meridian(zone);
    let dlon = geo.lon - lon0;

    if geo.lat.abs() >= std::f64::consts::FRAC_PI_2 || dlon.abs() > std::f64::consts::FRAC_PI_2 {
        bail!(
            "UTM {}: point hors domaine ({}, {})",
            zone,
            geo.lon.to_degrees(),
            geo.lat.to_degrees()
        );
    }

    let a = ellipsoid.a;
    let e2 = ellipsoid.e2();
    let ep2 = ellipsoid.ep2();

    let sin_lat = geo.lat.sin();
    let cos_lat = geo.lat.cos();
    let tan_lat = geo.lat.tan();

    let n = a / (1.0 - e2 * sin_lat.powi(2)).sqrt();
    let t = tan_lat.powi(2);
    let c = ep2 * cos_lat.powi(2);
    let big_a = cos_lat * dlon;
    let m = meridian_arc(geo.lat, a, e2);

    let x = K0
        * n
        * (big_a
            + (1.0 - t + c) * big_a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t.powi(2) + 72.0 * c - 58.0 * ep2) * big_a.powi(5) / 120.0)
        + X0;

    let y = K0
        * (m + n
            * tan_lat
            * (big_a.powi(2) / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c.powi(2)) * big_a.powi(4) / 24.0
                + (61.0 - 58.0 * t + t.powi(2) + 600.0 * c - 330.0 * ep2) * big_a.powi(6)
                    / 720.0));

    let y = if south { y + Y0_SOUTH } else { y };

    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_martinique() {
        // Fort-de-France approximativement
        // UTM Zone 20N: 708000, 1615000
        let geo = utm_to_geographic(708000.0, 1615000.0, 20, false, &Ellipsoid::WGS84).unwrap();
        let (lon, lat) = geo.to_degrees();

        // Fort-de-France: -61.07°E, 14.60°N
        assert!((lon - (-61.07)).abs() < 0.2, "lon={}", lon);
        assert!((lat - 14.60).abs() < 0.2, "lat={}", lat);
    }

    #[test]
    fn test_reunion() {
        // Saint-Denis approximativement
        // UTM Zone 40S: 338000, 7691000
        let geo = utm_to_geographic(338000.0, 7691000.0, 40, true, &Ellipsoid::WGS84).unwrap();
        let (lon, lat) = geo.to_degrees();

        // Saint-Denis: 55.45°E, -20.88°S
        assert!((lon - 55.45).abs() < 0.2, "lon={}", lon);
        assert!((lat - (-20.88)).abs() < 0.2, "lat={}", lat);
    }

    #[test]
    fn test_vienna_forward() {
        // Vienne: 16.37°E, 48.21°N → UTM 33N ≈ (601000, 5340000)
        let (x, y) =
            geographic_to_utm(Geographic::from_degrees(16.37, 48.21), 33, false, &Ellipsoid::WGS84)
                .unwrap();
        assert!((x - 601000.0).abs() < 2000.0, "x={}", x);
        assert!((y - 5340000.0).abs() < 5000.0, "y={}", y);
    }

    #[test]
    fn test_central_meridian_on_false_easting() {
        let (x, _) =
            geographic_to_utm(Geographic::from_degrees(-3.0, 40.0), 30, false, &Ellipsoid::GRS80)
                .unwrap();
        assert!((x - X0).abs() < 1e-6, "x={}", x);
    }

    #[test]
    fn test_roundtrip() {
        let start = Geographic::from_degrees(15.2, 47.5);
        let (x, y) = geographic_to_utm(start, 33, false, &Ellipsoid::WGS84).unwrap();
        let (lon, lat) = utm_to_geographic(x, y, 33, false, &Ellipsoid::WGS84)
            .unwrap()
            .to_degrees();
        assert!((lon - 15.2).abs() < 1e-6, "lon={}", lon);
        assert!((lat - 47.5).abs() < 1e-6, "lat={}", lat);
    }

    #[test]
    fn test_out_of_domain() {
        assert!(
            geographic_to_utm(Geographic::from_degrees(0.0, 90.0), 33, false, &Ellipsoid::WGS84)
                .is_err()
        );
    }
}
