//! Reprojection légère en Rust pur (sans dépendances externes)
//!
//! Registre fermé de CRS, chacun décrit par sa projection et son ellipsoïde :
//! - WGS84 (EPSG:4326), NAD83 (EPSG:4269) - longitude/latitude
//! - Web Mercator (EPSG:3857)
//! - Lambert 93 (EPSG:2154) - Métropole
//! - WGS84 / UTM 20N, 22N, 33N, 38S, 40S (EPSG:326xx / 327xx)
//! - ETRS89 / UTM 30N (EPSG:25830)
//!
//! Toute transformation passe par les coordonnées géographiques. Les datums
//! WGS84, GRS80, RGF93, NAD83 et ETRS89 sont confondus (écart submétrique).

mod ellipsoid;
mod lambert;
mod mercator;
mod utm;

pub use ellipsoid::Ellipsoid;
pub use mercator::MAX_LAT;

use anyhow::{bail, Result};

use crate::crs::CrsId;

/// Point en coordonnées géographiques (radians)
#[derive(Debug, Clone, Copy)]
pub struct Geographic {
    /// Longitude en radians
    pub lon: f64,
    /// Latitude en radians
    pub lat: f64,
}

impl Geographic {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Convertit en degrés
    pub fn to_degrees(self) -> (f64, f64) {
        (self.lon.to_degrees(), self.lat.to_degrees())
    }

    /// Crée depuis des degrés
    pub fn from_degrees(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg.to_radians(),
            lat: lat_deg.to_radians(),
        }
    }
}

/// Famille de projection d'un CRS enregistré
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Coordonnées géographiques en degrés (x = lon, y = lat)
    LongLat,
    WebMercator,
    Utm { zone: u8, south: bool },
    Lambert93,
}

/// Entrée du registre
#[derive(Debug, Clone, Copy)]
pub struct CrsDefinition {
    pub code: u32,
    pub title: &'static str,
    pub projection: Projection,
    pub ellipsoid: Ellipsoid,
}

/// Registre des CRS supportés, en lecture seule
pub static REGISTRY: &[CrsDefinition] = &[
    CrsDefinition {
        code: 4326,
        title: "WGS 84",
        projection: Projection::LongLat,
        ellipsoid: Ellipsoid::WGS84,
    },
    CrsDefinition {
        code: 4269,
        title: "NAD83",
        projection: Projection::LongLat,
        ellipsoid: Ellipsoid::GRS80,
    },
    CrsDefinition {
        code: 3857,
        title: "WGS 84 / Pseudo-Mercator",
        projection: Projection::WebMercator,
        ellipsoid: Ellipsoid::WGS84,
    },
    CrsDefinition {
        code: 2154,
        title: "RGF93 v1 / Lambert-93",
        projection: Projection::Lambert93,
        ellipsoid: Ellipsoid::GRS80,
    },
    CrsDefinition {
        code: 32620,
        title: "WGS 84 / UTM zone 20N",
        projection: Projection::Utm {
            zone: 20,
            south: false,
        },
        ellipsoid: Ellipsoid::WGS84,
    },
    CrsDefinition {
        code: 32622,
        title: "WGS 84 / UTM zone 22N",
        projection: Projection::Utm {
            zone: 22,
            south: false,
        },
        ellipsoid: Ellipsoid::WGS84,
    },
    CrsDefinition {
        code: 32633,
        title: "WGS 84 / UTM zone 33N",
        projection: Projection::Utm {
            zone: 33,
            south: false,
        },
        ellipsoid: Ellipsoid::WGS84,
    },
    CrsDefinition {
        code: 32738,
        title: "WGS 84 / UTM zone 38S",
        projection: Projection::Utm {
            zone: 38,
            south: true,
        },
        ellipsoid: Ellipsoid::WGS84,
    },
    CrsDefinition {
        code: 32740,
        title: "WGS 84 / UTM zone 40S",
        projection: Projection::Utm {
            zone: 40,
            south: true,
        },
        ellipsoid: Ellipsoid::WGS84,
    },
    CrsDefinition {
        code: 25830,
        title: "ETRS89 / UTM zone 30N",
        projection: Projection::Utm {
            zone: 30,
            south: false,
        },
        ellipsoid: Ellipsoid::GRS80,
    },
];

/// Cherche un CRS dans le registre
pub fn lookup(crs: &CrsId) -> Option<&'static CrsDefinition> {
    let code = crs.epsg_code()?;
    REGISTRY.iter().find(|def| def.code == code)
}

/// Codes EPSG du registre, pour les messages d'erreur
fn registered_codes() -> String {
    REGISTRY
        .iter()
        .map(|def| def.code.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl CrsDefinition {
    /// Coordonnées natives → géographiques
    fn to_geographic(&self, x: f64, y: f64) -> Result<Geographic> {
        match self.projection {
            Projection::LongLat => {
                if !(-90.0..=90.0).contains(&y) {
                    bail!("EPSG:{}: latitude hors domaine ({})", self.code, y);
                }
                Ok(Geographic::from_degrees(x, y))
            }
            Projection::WebMercator => mercator::inverse(x, y),
            Projection::Utm { zone, south } => {
                utm::utm_to_geographic(x, y, zone, south, &self.ellipsoid)
            }
            Projection::Lambert93 => lambert::LAMBERT_93.inverse(x, y, &self.ellipsoid),
        }
    }

    /// Coordonnées géographiques → natives
    fn from_geographic(&self, geo: Geographic) -> Result<(f64, f64)> {
        match self.projection {
            Projection::LongLat => Ok(geo.to_degrees()),
            Projection::WebMercator => mercator::forward(geo),
            Projection::Utm { zone, south } => {
                utm::geographic_to_utm(geo, zone, south, &self.ellipsoid)
            }
            Projection::Lambert93 => lambert::LAMBERT_93.forward(geo, &self.ellipsoid),
        }
    }
}

/// Reprojection entre deux CRS du registre
#[derive(Debug, Clone, Copy)]
pub struct ReprojectorLite {
    source: &'static CrsDefinition,
    target: &'static CrsDefinition,
}

impl ReprojectorLite {
    /// Crée un nouveau reprojector
    pub fn new(source: &CrsId, target: &CrsId) -> Result<Self> {
        let Some(source_def) = lookup(source) else {
            bail!(
                "{} non supporté. CRS enregistrés: {}",
                source,
                registered_codes()
            );
        };
        let Some(target_def) = lookup(target) else {
            bail!(
                "{} non supporté. CRS enregistrés: {}",
                target,
                registered_codes()
            );
        };

        Ok(Self {
            source: source_def,
            target: target_def,
        })
    }

    /// Vérifie si la reprojection est supportée
    pub fn is_supported(source: &CrsId, target: &CrsId) -> bool {
        lookup(source).is_some() && lookup(target).is_some()
    }

    /// Transforme un point (x, y) de la source vers la cible
    pub fn transform_point(&self, x: f64, y: f64) -> Result<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            bail!("coordonnées non finies ({}, {})", x, y);
        }

        // Étape 1: Source → Géographique
        let geo = self.source.to_geographic(x, y)?;

        // Étape 2: Géographique → Cible
        let (tx, ty) = self.target.from_geographic(geo)?;

        if !tx.is_finite() || !ty.is_finite() {
            bail!(
                "EPSG:{} → EPSG:{}: résultat non fini pour ({}, {})",
                self.source.code,
                self.target.code,
                x,
                y
            );
        }
        Ok((tx, ty))
    }
}
