//! Assemblage des étapes: style QML, document géographique, peinture

use std::path::Path;
use std::sync::Arc;

use geojson::GeoJson;
use qmlstyle::{StyleError, StyleWarning};
use tracing::{info, warn};

use crate::active::{ActiveStyle, StyleDefinition};
use crate::config::Config;
use crate::document;
use crate::error::DocumentError;
use crate::paint::{LayerPaint, LayerStyle};
use crate::reproject;

/// Résultat du chargement d'un style
#[derive(Debug)]
pub struct LoadedStyle {
    /// Style publié comme style actif
    pub definition: Arc<StyleDefinition>,
    /// Avertissements du parsing QML
    pub warnings: Vec<StyleWarning>,
    /// Erreur ayant provoqué le repli sur la symbologie par défaut
    pub fallback: Option<StyleError>,
}

impl LoadedStyle {
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Pipeline de style d'une carte
#[derive(Debug, Default)]
pub struct MapPipeline {
    config: Config,
    active: ActiveStyle,
}

impl MapPipeline {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            active: ActiveStyle::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn active(&self) -> &ActiveStyle {
        &self.active
    }

    /// Couches par défaut d'une source sans style exploitable
    pub fn default_layers(&self, source_id: &str) -> StyleDefinition {
        let paint = LayerPaint::from_style(&LayerStyle::from_config(&self.config));
        StyleDefinition {
            source_id: source_id.to_string(),
            layers: paint.layers(source_id),
        }
    }

    /// Charge un style QML brut et le publie.
    ///
    /// Un document inexploitable ne fait pas échouer l'appel: la symbologie
    /// par défaut est publiée et l'erreur est rapportée dans `fallback`.
    pub fn load_style(&self, data: &[u8], source_id: &str) -> LoadedStyle {
        self.publish(qmlstyle::parse_bytes(data), source_id)
    }

    /// Charge un fichier `.qml` (extension et taille vérifiées) et le publie
    pub fn load_style_file(&self, path: &Path, source_id: &str) -> LoadedStyle {
        self.publish(
            qmlstyle::load(path, self.config.max_style_bytes),
            source_id,
        )
    }

    fn publish(
        &self,
        parsed: Result<qmlstyle::ParseResult, StyleError>,
        source_id: &str,
    ) -> LoadedStyle {
        let (definition, warnings, fallback) = match parsed {
            Ok(result) if !result.style.is_empty() => {
                let layers = qmlstyle::build_layers(&result.style, &result.outlines, source_id);
                info!(
                    source = source_id,
                    categories = result.style.categories().len(),
                    layers = layers.len(),
                    warnings = result.warnings.len(),
                    "Style QML chargé"
                );
                let definition = StyleDefinition {
                    source_id: source_id.to_string(),
                    layers,
                };
                (definition, result.warnings, None)
            }
            Ok(result) => {
                info!(source = source_id, "Style QML vide, symbologie par défaut");
                (self.default_layers(source_id), result.warnings, None)
            }
            Err(e) => {
                warn!(source = source_id, error = %e, "Style QML rejeté, symbologie par défaut");
                (self.default_layers(source_id), Vec::new(), Some(e))
            }
        };

        let definition = Arc::new(definition);
        self.active.set_active(Arc::clone(&definition));

        LoadedStyle {
            definition,
            warnings,
            fallback,
        }
    }

    /// Charge un document et le reprojette vers le CRS cible de la configuration
    pub fn prepare_document(&self, text: &str) -> Result<GeoJson, DocumentError> {
        let doc = document::load(text)?;
        Ok(reproject::reproject_detected(&doc, &self.config.target_crs).into_owned())
    }

    /// Peinture d'une couche à partir de ses règles
    pub fn paint(&self, style: &LayerStyle) -> LayerPaint {
        LayerPaint::from_style(style)
    }
}
