//! Chargement et inspection des documents GeoJSON

use geo::{BoundingRect, MultiPoint, Point, Rect};
use geojson::{GeoJson, JsonObject, Value};
use tracing::debug;

use crate::error::DocumentError;

/// Types GeoJSON acceptés à la racine
const KNOWN_TYPES: &[&str] = &[
    "FeatureCollection",
    "Feature",
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
];

/// Charge un document depuis du texte JSON
pub fn load(text: &str) -> Result<GeoJson, DocumentError> {
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(DocumentError::Empty);
    }

    let value: serde_json::Value = serde_json::from_str(text)?;

    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or(DocumentError::MissingType)?
        .to_string();
    if !KNOWN_TYPES.contains(&kind.as_str()) {
        return Err(DocumentError::UnknownType(kind));
    }

    let doc = GeoJson::from_json_value(value).map_err(|e| DocumentError::Invalid(e.to_string()))?;
    debug!(kind = %kind, "Document chargé");
    Ok(doc)
}

/// Charge un document depuis des octets UTF-8
pub fn load_bytes(data: &[u8]) -> Result<GeoJson, DocumentError> {
    // Fast path SIMD, l'erreur détaillée vient de std
    let text = match simdutf8::basic::from_utf8(data) {
        Ok(s) => s,
        Err(_) => std::str::from_utf8(data)?,
    };
    load(text)
}

/// Champs attributaires d'un document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSummary {
    /// Clés des propriétés, dans l'ordre du document
    pub fields: Vec<String>,
    /// Sous-ensemble des champs à valeur booléenne
    pub boolean_fields: Vec<String>,
    /// Sous-ensemble des champs texte (candidats aux catégories)
    pub text_fields: Vec<String>,
}

/// Propriétés de référence: la première feature du document
fn sample_properties(doc: &GeoJson) -> Option<&JsonObject> {
    match doc {
        GeoJson::FeatureCollection(fc) => fc.features.first()?.properties.as_ref(),
        GeoJson::Feature(f) => f.properties.as_ref(),
        GeoJson::Geometry(_) => None,
    }
}

/// Découvre les champs à partir de la première feature
pub fn discover_fields(doc: &GeoJson) -> FieldSummary {
    let Some(properties) = sample_properties(doc) else {
        return FieldSummary::default();
    };

    let fields = properties.keys().cloned().collect();
    let keys_where = |pred: fn(&serde_json::Value) -> bool| -> Vec<String> {
        properties
            .iter()
            .filter(|(_, v)| pred(v))
            .map(|(k, _)| k.clone())
            .collect()
    };

    FieldSummary {
        fields,
        boolean_fields: keys_where(serde_json::Value::is_boolean),
        text_fields: keys_where(serde_json::Value::is_string),
    }
}

/// Valeurs texte distinctes d'un champ, dans l'ordre d'apparition
pub fn distinct_text_values(doc: &GeoJson, field: &str) -> Vec<String> {
    let features: &[geojson::Feature] = match doc {
        GeoJson::FeatureCollection(fc) => &fc.features,
        GeoJson::Feature(f) => std::slice::from_ref(f),
        GeoJson::Geometry(_) => &[],
    };

    let mut values: Vec<String> = Vec::new();
    for feature in features {
        if let Some(serde_json::Value::String(v)) = feature.property(field) {
            if !values.iter().any(|known| known == v) {
                values.push(v.clone());
            }
        }
    }
    values
}

/// Emprise de toutes les positions du document
pub fn bounds(doc: &GeoJson) -> Option<Rect<f64>> {
    let mut points = Vec::new();
    match doc {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(geometry) = &feature.geometry {
                    collect_points(&geometry.value, &mut points);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(geometry) = &f.geometry {
                collect_points(&geometry.value, &mut points);
            }
        }
        GeoJson::Geometry(g) => collect_points(&g.value, &mut points),
    }

    MultiPoint::new(points).bounding_rect()
}

fn push_position(position: &[f64], out: &mut Vec<Point<f64>>) {
    if let [x, y, ..] = position {
        if x.is_finite() && y.is_finite() {
            out.push(Point::new(*x, *y));
        }
    }
}

fn collect_points(value: &Value, out: &mut Vec<Point<f64>>) {
    match value {
        Value::Point(p) => push_position(p, out),
        Value::MultiPoint(ps) | Value::LineString(ps) => {
            ps.iter().for_each(|p| push_position(p, out))
        }
        Value::MultiLineString(lines) | Value::Polygon(lines) => {
            lines.iter().flatten().for_each(|p| push_position(p, out))
        }
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .flatten()
            .flatten()
            .for_each(|p| push_position(p, out)),
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_points(&geometry.value, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_errors() {
        assert!(matches!(load(""), Err(DocumentError::Empty)));
        assert!(matches!(load("  \n"), Err(DocumentError::Empty)));
        assert!(matches!(load("{"), Err(DocumentError::Json(_))));
        assert!(matches!(
            load(r#"{"features": []}"#),
            Err(DocumentError::MissingType)
        ));
        assert!(matches!(
            load(r#"{"type": "Topology"}"#),
            Err(DocumentError::UnknownType(t)) if t == "Topology"
        ));
        assert!(matches!(
            load(r#"{"type": "Point"}"#),
            Err(DocumentError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_bytes() {
        let doc = load_bytes(b"\xef\xbb\xbf{\"type\": \"Point\", \"coordinates\": [1, 2]}").unwrap();
        assert!(matches!(doc, GeoJson::Geometry(_)));

        assert!(matches!(
            load_bytes(b"{\"type\": \"\xff\"}"),
            Err(DocumentError::Encoding(_))
        ));
    }

    #[test]
    fn test_discover_fields() {
        let doc = load(
            r#"{
                "type": "FeatureCollection",
                "features": [
                    { "type": "Feature", "geometry": null,
                      "properties": { "name": "a", "open": true, "height": 12, "public": false } },
                    { "type": "Feature", "geometry": null,
                      "properties": { "other": true } }
                ]
            }"#,
        )
        .unwrap();

        let summary = discover_fields(&doc);
        assert_eq!(summary.fields, vec!["name", "open", "height", "public"]);
        assert_eq!(summary.boolean_fields, vec!["open", "public"]);
        assert_eq!(summary.text_fields, vec!["name"]);
    }

    #[test]
    fn test_distinct_text_values() {
        let doc = load(
            r#"{
                "type": "FeatureCollection",
                "features": [
                    { "type": "Feature", "geometry": null, "properties": { "kind": "b" } },
                    { "type": "Feature", "geometry": null, "properties": { "kind": "a" } },
                    { "type": "Feature", "geometry": null, "properties": { "kind": 3 } },
                    { "type": "Feature", "geometry": null, "properties": { "kind": "b" } }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(distinct_text_values(&doc, "kind"), vec!["b", "a"]);
        assert!(distinct_text_values(&doc, "missing").is_empty());
    }

    #[test]
    fn test_discover_fields_without_features() {
        let doc = load(r#"{"type": "FeatureCollection", "features": []}"#).unwrap();
        assert_eq!(discover_fields(&doc), FieldSummary::default());
    }

    #[test]
    fn test_bounds() {
        let doc = load(
            r#"{
                "type": "FeatureCollection",
                "features": [
                    { "type": "Feature", "properties": {},
                      "geometry": { "type": "Point", "coordinates": [2.0, 48.0] } },
                    { "type": "Feature", "properties": {},
                      "geometry": { "type": "MultiPolygon", "coordinates": [[[[-1.0, 43.0], [5.0, 43.0], [5.0, 50.0], [-1.0, 43.0]]]] } }
                ]
            }"#,
        )
        .unwrap();

        let rect = bounds(&doc).unwrap();
        assert_eq!(rect.min().x, -1.0);
        assert_eq!(rect.min().y, 43.0);
        assert_eq!(rect.max().x, 5.0);
        assert_eq!(rect.max().y, 50.0);
    }

    #[test]
    fn test_bounds_empty() {
        let doc = load(r#"{"type": "Feature", "properties": {}, "geometry": null}"#).unwrap();
        assert!(bounds(&doc).is_none());
    }
}
