//! Configuration du pipeline

use serde::{Deserialize, Serialize};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::crs::CrsId;

/// Variable d'environnement: CRS cible des reprojections
pub const ENV_TARGET_CRS: &str = "MAPSTYLE_TARGET_CRS";
/// Variable d'environnement: taille maximale d'un style (octets)
pub const ENV_MAX_STYLE_BYTES: &str = "MAPSTYLE_MAX_STYLE_BYTES";

/// Configuration principale
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// CRS vers lequel les documents sont reprojetés
    pub target_crs: CrsId,

    /// Taille maximale d'un fichier `.qml`
    pub max_style_bytes: u64,

    /// Symbologie par défaut d'une couche sans style
    pub default_color: String,
    pub fill_opacity: f64,
    pub stroke_color: String,
    pub stroke_width: f64,
    pub stroke_opacity: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_crs: CrsId::wgs84(),
            max_style_bytes: qmlstyle::DEFAULT_MAX_BYTES,
            default_color: "#00bcd4".to_string(),
            fill_opacity: 0.45,
            stroke_color: "#000000".to_string(),
            stroke_width: 1.0,
            stroke_opacity: 1.0,
        }
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "default" => Self::load_embedded(include_str!("presets/default.json")),
            "mercator" => Self::load_embedded(include_str!("presets/mercator.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: default, mercator", preset),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    /// Applique les surcharges de l'environnement (`.env` compris)
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(
            std::env::var(ENV_TARGET_CRS).ok().as_deref(),
            std::env::var(ENV_MAX_STYLE_BYTES).ok().as_deref(),
        )
    }

    fn apply_overrides(&mut self, target_crs: Option<&str>, max_bytes: Option<&str>) -> Result<()> {
        if let Some(value) = target_crs {
            self.target_crs = value
                .parse::<CrsId>()
                .with_context(|| format!("Invalid {}: {}", ENV_TARGET_CRS, value))?;
            debug!(target_crs = %self.target_crs, "CRS cible depuis l'environnement");
        }
        if let Some(value) = max_bytes {
            self.max_style_bytes = value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid {}: {}", ENV_MAX_STYLE_BYTES, value))?;
        }
        Ok(())
    }
}
