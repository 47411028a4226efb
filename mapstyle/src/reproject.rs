//! Reprojection de documents GeoJSON
//!
//! Le document source n'est jamais modifié: la reprojection travaille sur un
//! clone, ou emprunte l'entrée quand il n'y a rien à faire.

use std::borrow::Cow;
use std::ops::Add;

use geojson::{Feature, GeoJson, Geometry, JsonObject, Position, Value};
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::crs::{self, CrsId};
use crate::reproject_lite::ReprojectorLite;

/// Compteurs d'une reprojection
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReprojectStats {
    /// Points transformés
    pub points: usize,
    /// Points laissés tels quels (ordonnées manquantes, valeurs non finies)
    pub skipped: usize,
}

impl Add for ReprojectStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            points: self.points + rhs.points,
            skipped: self.skipped + rhs.skipped,
        }
    }
}

/// Reprojette `doc` de `from` vers `to`.
///
/// - CRS identiques: l'entrée est empruntée telle quelle
/// - CRS hors registre: avertissement, entrée empruntée telle quelle
/// - sinon: clone dont chaque position est transformée; un point en échec
///   reste inchangé sans interrompre le parcours
pub fn reproject<'a>(doc: &'a GeoJson, from: &CrsId, to: &CrsId) -> Cow<'a, GeoJson> {
    if from == to {
        return Cow::Borrowed(doc);
    }

    let reprojector = match ReprojectorLite::new(from, to) {
        Ok(r) => r,
        Err(e) => {
            warn!(from = %from, to = %to, error = %e, "CRS non supporté, document inchangé");
            return Cow::Borrowed(doc);
        }
    };

    debug!(from = %from, to = %to, "Reprojection");

    let mut output = doc.clone();
    let stats = walk_document(&reprojector, &mut output);
    rewrite_crs_member(&mut output, to);

    if stats.skipped > 0 {
        warn!(
            from = %from,
            to = %to,
            points = stats.points,
            skipped = stats.skipped,
            "Points non reprojetés"
        );
    } else {
        debug!(points = stats.points, "Reprojection terminée");
    }

    Cow::Owned(output)
}

/// Reprojette vers `to` depuis le CRS détecté dans le document
pub fn reproject_detected<'a>(doc: &'a GeoJson, to: &CrsId) -> Cow<'a, GeoJson> {
    let from = crs::detect(doc);
    reproject(doc, &from, to)
}

/// Reprojette vers WGS84 (EPSG:4326) depuis le CRS détecté
pub fn reproject_to_default(doc: &GeoJson) -> Cow<'_, GeoJson> {
    reproject_detected(doc, &CrsId::wgs84())
}

fn walk_document(r: &ReprojectorLite, doc: &mut GeoJson) -> ReprojectStats {
    match doc {
        GeoJson::FeatureCollection(fc) => {
            fc.bbox = None;
            fc.features
                .par_iter_mut()
                .map(|feature| walk_feature(r, feature))
                .reduce(ReprojectStats::default, |a, b| a + b)
        }
        GeoJson::Feature(feature) => walk_feature(r, feature),
        GeoJson::Geometry(geometry) => walk_geometry(r, geometry),
    }
}

fn walk_feature(r: &ReprojectorLite, feature: &mut Feature) -> ReprojectStats {
    feature.bbox = None;
    match feature.geometry.as_mut() {
        Some(geometry) => walk_geometry(r, geometry),
        None => ReprojectStats::default(),
    }
}

fn walk_geometry(r: &ReprojectorLite, geometry: &mut Geometry) -> ReprojectStats {
    geometry.bbox = None;
    walk_value(r, &mut geometry.value)
}

fn walk_value(r: &ReprojectorLite, value: &mut Value) -> ReprojectStats {
    match value {
        Value::Point(position) => transform_position(r, position),
        Value::MultiPoint(positions) | Value::LineString(positions) => {
            transform_positions(r, positions)
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => lines
            .iter_mut()
            .map(|line| transform_positions(r, line))
            .fold(ReprojectStats::default(), Add::add),
        Value::MultiPolygon(polygons) => polygons
            .iter_mut()
            .flatten()
            .map(|ring| transform_positions(r, ring))
            .fold(ReprojectStats::default(), Add::add),
        Value::GeometryCollection(geometries) => geometries
            .iter_mut()
            .map(|geometry| walk_geometry(r, geometry))
            .fold(ReprojectStats::default(), Add::add),
    }
}

fn transform_positions(r: &ReprojectorLite, positions: &mut [Position]) -> ReprojectStats {
    positions
        .iter_mut()
        .map(|position| transform_position(r, position))
        .fold(ReprojectStats::default(), Add::add)
}

/// Transforme x/y; les ordonnées supplémentaires (altitude, mesure) sont conservées
fn transform_position(r: &ReprojectorLite, position: &mut Position) -> ReprojectStats {
    if position.len() < 2 {
        trace!(len = position.len(), "Position incomplète ignorée");
        return ReprojectStats {
            points: 0,
            skipped: 1,
        };
    }

    match r.transform_point(position[0], position[1]) {
        Ok((x, y)) => {
            position[0] = x;
            position[1] = y;
            ReprojectStats {
                points: 1,
                skipped: 0,
            }
        }
        Err(e) => {
            trace!(error = %e, "Point non reprojeté");
            ReprojectStats {
                points: 0,
                skipped: 1,
            }
        }
    }
}

/// Met à jour le membre `crs` du document reprojeté.
///
/// EPSG:4326 est le CRS implicite d'un GeoJSON: le membre est retiré.
fn rewrite_crs_member(doc: &mut GeoJson, to: &CrsId) {
    let foreign = match doc {
        GeoJson::FeatureCollection(fc) => &mut fc.foreign_members,
        GeoJson::Feature(f) => &mut f.foreign_members,
        GeoJson::Geometry(g) => &mut g.foreign_members,
    };

    if to.is_default() {
        if let Some(members) = foreign.as_mut() {
            members.remove("crs");
            if members.is_empty() {
                *foreign = None;
            }
        }
        return;
    }

    let crs = serde_json::json!({
        "type": "name",
        "properties": { "name": to.to_urn() }
    });
    foreign
        .get_or_insert_with(JsonObject::new)
        .insert("crs".to_string(), crs);
}
