//! Style utilisateur d'une couche et peinture résultante

use geojson::GeoJson;
use qmlstyle::render::{default_filter, RenderLayer};
use qmlstyle::types::LayerKind;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::expression::{Color, PaintExpression};
use super::rules::{deserialize_boolean_rules, BooleanRule, CategoricalRule, NumericRule};
use crate::config::Config;
use crate::document;

/// Réglages d'apparence d'une couche, tels que saisis par l'utilisateur
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerStyle {
    /// Couleur de base, aussi couleur de repli des expressions
    pub color: Color,
    pub fill_opacity: f64,
    pub stroke_color: Color,
    pub stroke_width: f64,
    pub stroke_opacity: f64,
    #[serde(deserialize_with = "deserialize_boolean_rules")]
    pub boolean_styles: Vec<BooleanRule>,
    pub text_categories: Option<CategoricalRule>,
    /// Comparaisons numériques entre deux champs
    pub rules: Vec<NumericRule>,
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl LayerStyle {
    /// Style sans règle, symbologie de la configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            color: config.default_color.clone(),
            fill_opacity: config.fill_opacity,
            stroke_color: config.stroke_color.clone(),
            stroke_width: config.stroke_width,
            stroke_opacity: config.stroke_opacity,
            boolean_styles: Vec::new(),
            text_categories: None,
            rules: Vec::new(),
        }
    }

    /// Style initial d'un document: une règle désactivée par champ booléen
    pub fn for_document(doc: &GeoJson, config: &Config) -> Self {
        let fields = document::discover_fields(doc);
        Self {
            boolean_styles: fields
                .boolean_fields
                .into_iter()
                .map(BooleanRule::disabled)
                .collect(),
            ..Self::from_config(config)
        }
    }

    /// Choisit le champ texte des catégories et aligne ses valeurs sur le document
    pub fn set_text_field(&mut self, doc: &GeoJson, field: &str) {
        let observed = document::distinct_text_values(doc, field);
        let mut rule = match self.text_categories.take() {
            Some(rule) if rule.field == field => rule,
            _ => CategoricalRule::new(field),
        };
        rule.sync_values(&observed);
        self.text_categories = Some(rule);
    }

    /// Expression de couleur de remplissage
    pub fn fill_color(&self) -> PaintExpression {
        super::build(
            &self.boolean_styles,
            self.text_categories.as_ref(),
            &self.rules,
            &self.color,
        )
    }
}

/// Propriétés `paint` du remplissage et du contour d'une couche
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerPaint {
    pub fill: Map<String, Value>,
    pub line: Map<String, Value>,
}

impl LayerPaint {
    pub fn from_style(style: &LayerStyle) -> Self {
        let mut fill = Map::new();
        fill.insert("fill-color".to_string(), style.fill_color().to_json());
        fill.insert("fill-opacity".to_string(), json!(style.fill_opacity));

        let mut line = Map::new();
        line.insert("line-color".to_string(), json!(style.stroke_color));
        line.insert("line-width".to_string(), json!(style.stroke_width));
        line.insert("line-opacity".to_string(), json!(style.stroke_opacity));

        Self { fill, line }
    }

    /// Couches `{source}-fill` et `{source}-outline`
    pub fn layers(&self, source_id: &str) -> Vec<RenderLayer> {
        let mut layout = Map::new();
        layout.insert("visibility".to_string(), json!("visible"));

        vec![
            RenderLayer {
                id: format!("{}-fill", source_id),
                kind: LayerKind::Fill,
                source: source_id.to_string(),
                filter: default_filter(),
                paint: self.fill.clone(),
                layout: layout.clone(),
            },
            RenderLayer {
                id: format!("{}-outline", source_id),
                kind: LayerKind::Line,
                source: source_id.to_string(),
                filter: default_filter(),
                paint: self.line.clone(),
                layout,
            },
        ]
    }
}
