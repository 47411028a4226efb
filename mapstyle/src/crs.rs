//! Identifiants de CRS et détection depuis les métadonnées GeoJSON

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use geojson::{GeoJson, JsonObject};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CrsParseError;

/// Code EPSG du CRS par défaut (WGS84 lon/lat)
pub const DEFAULT_EPSG: u32 = 4326;

/// Identifiant `autorité:code` (ex: `EPSG:3857`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CrsId {
    authority: String,
    code: String,
}

impl CrsId {
    pub fn new(authority: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            authority: authority.into().to_ascii_uppercase(),
            code: code.into(),
        }
    }

    pub fn epsg(code: u32) -> Self {
        Self::new("EPSG", code.to_string())
    }

    /// WGS84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::epsg(DEFAULT_EPSG)
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Code numérique si l'autorité est EPSG
    pub fn epsg_code(&self) -> Option<u32> {
        if self.authority == "EPSG" {
            self.code.parse().ok()
        } else {
            None
        }
    }

    pub fn is_default(&self) -> bool {
        self.epsg_code() == Some(DEFAULT_EPSG)
    }

    /// Forme URN OGC, utilisée dans le membre `crs` des GeoJSON
    pub fn to_urn(&self) -> String {
        format!("urn:ogc:def:crs:{}::{}", self.authority, self.code)
    }
}

impl Default for CrsId {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl fmt::Display for CrsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.authority, self.code)
    }
}

impl FromStr for CrsId {
    type Err = CrsParseError;

    /// Accepte `EPSG:3857`, `epsg:3857` et `urn:ogc:def:crs:EPSG::3857`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("urn:ogc:def:crs:")
            .unwrap_or(trimmed);

        let (authority, code) = body
            .split_once(':')
            .ok_or_else(|| CrsParseError(s.to_string()))?;
        // La forme URN peut porter une version vide: EPSG::3857
        let code = code.trim_start_matches(':');

        if authority.is_empty()
            || code.is_empty()
            || !authority.chars().all(|c| c.is_ascii_alphanumeric())
            || !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
        {
            return Err(CrsParseError(s.to_string()));
        }

        Ok(Self::new(authority, code))
    }
}

impl TryFrom<String> for CrsId {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CrsId> for String {
    fn from(value: CrsId) -> Self {
        value.to_string()
    }
}

fn epsg_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"EPSG:*([0-9]+)").expect("valid EPSG regex"))
}

/// Membre `crs` d'un document (collection, feature ou géométrie)
pub fn crs_member(doc: &GeoJson) -> Option<&JsonObject> {
    let foreign = match doc {
        GeoJson::FeatureCollection(fc) => fc.foreign_members.as_ref(),
        GeoJson::Feature(f) => f.foreign_members.as_ref(),
        GeoJson::Geometry(g) => g.foreign_members.as_ref(),
    }?;
    foreign.get("crs")?.as_object()
}

/// Nom du CRS: `crs.properties.name`, sinon `crs.name`
fn crs_name(doc: &GeoJson) -> Option<&str> {
    let crs = crs_member(doc)?;
    // Un nom vide dans `properties` laisse sa chance au `name` de premier niveau
    non_empty(crs.get("properties").and_then(|p| p.get("name")))
        .or_else(|| non_empty(crs.get("name")))
}

fn non_empty(value: Option<&serde_json::Value>) -> Option<&str> {
    value
        .and_then(|n| n.as_str())
        .filter(|name| !name.trim().is_empty())
}

/// Détecte le CRS d'un document.
///
/// Retourne EPSG:4326 quand aucune métadonnée exploitable n'est présente.
/// Ne produit jamais d'erreur: un identifiant inconnu sera rejeté plus loin
/// par le registre de projections.
pub fn detect(doc: &GeoJson) -> CrsId {
    let Some(name) = crs_name(doc) else {
        return CrsId::wgs84();
    };

    match epsg_regex().captures(name) {
        Some(caps) => {
            let crs = CrsId::new("EPSG", &caps[1]);
            debug!(name, crs = %crs, "CRS détecté");
            crs
        }
        None => {
            debug!(name, "CRS sans code EPSG, WGS84 par défaut");
            CrsId::wgs84()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(crs: serde_json::Value) -> GeoJson {
        let value = serde_json::json!({
            "type": "FeatureCollection",
            "crs": crs,
            "features": []
        });
        GeoJson::from_json_value(value).unwrap()
    }

    #[test]
    fn test_detect_urn() {
        let d = doc(serde_json::json!({
            "type": "name",
            "properties": { "name": "urn:ogc:def:crs:EPSG::3857" }
        }));
        assert_eq!(detect(&d), CrsId::epsg(3857));
    }

    #[test]
    fn test_detect_short_name() {
        let d = doc(serde_json::json!({ "name": "EPSG:32633" }));
        assert_eq!(detect(&d), CrsId::epsg(32633));
    }

    #[test]
    fn test_empty_properties_name_falls_back() {
        let d = doc(serde_json::json!({
            "type": "name",
            "name": "EPSG:3857",
            "properties": { "name": "" }
        }));
        assert_eq!(detect(&d), CrsId::epsg(3857));
    }

    #[test]
    fn test_detect_defaults() {
        let plain = GeoJson::from_json_value(serde_json::json!({
            "type": "Point",
            "coordinates": [1.0, 2.0]
        }))
        .unwrap();
        assert_eq!(detect(&plain), CrsId::wgs84());

        let crs84 = doc(serde_json::json!({
            "type": "name",
            "properties": { "name": "urn:ogc:def:crs:OGC:1.3:CRS84" }
        }));
        assert_eq!(detect(&crs84), CrsId::wgs84());
    }

    #[test]
    fn test_parse_crs_id() {
        assert_eq!("EPSG:2154".parse::<CrsId>().unwrap(), CrsId::epsg(2154));
        assert_eq!("epsg:2154".parse::<CrsId>().unwrap(), CrsId::epsg(2154));
        assert_eq!(
            "urn:ogc:def:crs:EPSG::25830".parse::<CrsId>().unwrap(),
            CrsId::epsg(25830)
        );
        assert_eq!(
            "ESRI:102100".parse::<CrsId>().unwrap().epsg_code(),
            None
        );
        assert!("4326".parse::<CrsId>().is_err());
        assert!("EPSG:".parse::<CrsId>().is_err());
    }

    #[test]
    fn test_display_and_urn() {
        let crs = CrsId::epsg(3857);
        assert_eq!(crs.to_string(), "EPSG:3857");
        assert_eq!(crs.to_urn(), "urn:ogc:def:crs:EPSG::3857");
        assert_eq!(crs.to_urn().parse::<CrsId>().unwrap(), crs);
    }
}
