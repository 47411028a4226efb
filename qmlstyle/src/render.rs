//! Assemblage des couches finales pour le moteur de rendu

use serde::Serialize;
use serde_json::{json, Map, Number, Value};

use crate::normalize::fix_transparency;
use crate::outline::Outlines;
use crate::types::{LayerKind, QmlStyle};

/// Couche concrète, prête à être ajoutée à une source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderLayer {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub source: String,
    pub filter: Value,
    pub paint: Map<String, Value>,
    pub layout: Map<String, Value>,
}

/// Filtre appliqué quand une catégorie n'en définit pas
pub fn default_filter() -> Value {
    json!(["==", "$type", "Polygon"])
}

/// Construit les couches d'une source à partir du style catégorisé.
///
/// - les couleurs `r,g,b,a` sont séparées en couleur + opacité
/// - les couches `line` reçoivent l'épaisseur de contour corrigée de leur
///   règle; leur couleur propre est conservée
pub fn build_layers(style: &QmlStyle, outlines: &Outlines, source_id: &str) -> Vec<RenderLayer> {
    let mut layers = Vec::new();

    for (position, category) in style.categories().iter().enumerate() {
        let correction = outlines.get(category.index, category.symbol.as_deref());

        for layer in &category.layers {
            let mut paint = layer.paint.clone();
            fix_transparency(layer.kind, &mut paint);

            if layer.kind == LayerKind::Line {
                if let Some(correction) = correction {
                    if let Some(width) = Number::from_f64(correction.width) {
                        paint.insert("line-width".to_string(), Value::Number(width));
                    }
                }
            }

            let mut layout = layer.layout.clone();
            layout.insert("visibility".to_string(), json!("visible"));

            layers.push(RenderLayer {
                id: format!("{}-{}-{}", source_id, position, layer.kind.as_str()),
                kind: layer.kind,
                source: source_id.to_string(),
                filter: category.filter.clone().unwrap_or_else(default_filter),
                paint,
                layout,
            });
        }
    }

    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::extract_outlines;
    use crate::types::{Category, StyleLayer};

    fn line_layer(width: f64) -> StyleLayer {
        let mut paint = Map::new();
        paint.insert("line-color".to_string(), json!("10,10,10,255"));
        paint.insert("line-width".to_string(), json!(width));
        StyleLayer {
            kind: LayerKind::Line,
            paint,
            layout: Map::new(),
        }
    }

    #[test]
    fn test_outline_overrides_line_width() {
        let qml = r#"<symbol name="0"><prop k="outline_width" v="9"/></symbol>
<symbol name="1"><prop k="outline_color" v="255,0,0,255"/><prop k="outline_width" v="2.5"/></symbol>"#;
        let outlines = extract_outlines(qml);
        let style = QmlStyle::Categorized(vec![
            Category {
                id: "category-0".to_string(),
                index: 0,
                symbol: Some("0".to_string()),
                filter: None,
                layers: vec![line_layer(0.26)],
            },
            Category {
                id: "category-1".to_string(),
                index: 1,
                symbol: Some("1".to_string()),
                filter: Some(json!(["==", ["get", "k"], "v"])),
                layers: vec![line_layer(0.26)],
            },
        ]);

        let layers = build_layers(&style, &outlines, "src");
        assert_eq!(layers.len(), 2);

        // Pas de correction complète pour le premier symbole
        assert_eq!(layers[0].paint["line-width"], json!(0.26));
        assert_eq!(layers[0].paint["line-color"], json!("rgb(10,10,10)"));
        assert_eq!(layers[0].filter, default_filter());
        assert_eq!(layers[0].id, "src-0-line");

        assert_eq!(layers[1].paint["line-width"], json!(2.5));
        assert_eq!(layers[1].paint["line-color"], json!("rgb(10,10,10)"));
        assert_eq!(layers[1].layout["visibility"], json!("visible"));
    }

    #[test]
    fn test_fill_outline_does_not_recolor_line() {
        // Remplissage avec contour gris suivi d'une ligne rouge
        let qml = r#"<symbol name="0">
  <layer class="SimpleFill"><prop k="outline_color" v="35,35,35,255"/><prop k="outline_width" v="0.46"/></layer>
  <layer class="SimpleLine"><prop k="line_color" v="200,0,0,255"/><prop k="line_width" v="1"/></layer>
</symbol>"#;
        let outlines = extract_outlines(qml);

        let mut fill_paint = Map::new();
        fill_paint.insert("fill-color".to_string(), json!("1,2,3,255"));
        fill_paint.insert("fill-outline-color".to_string(), json!("35,35,35,255"));
        let mut line_paint = Map::new();
        line_paint.insert("line-color".to_string(), json!("200,0,0,255"));
        line_paint.insert("line-width".to_string(), json!(1.0));

        let style = QmlStyle::Categorized(vec![Category {
            id: "category-0".to_string(),
            index: 0,
            symbol: Some("0".to_string()),
            filter: None,
            layers: vec![
                StyleLayer {
                    kind: LayerKind::Fill,
                    paint: fill_paint,
                    layout: Map::new(),
                },
                StyleLayer {
                    kind: LayerKind::Line,
                    paint: line_paint,
                    layout: Map::new(),
                },
            ],
        }]);

        let layers = build_layers(&style, &outlines, "src");
        assert_eq!(layers[0].paint["fill-outline-color"], json!("rgba(35,35,35,1)"));
        assert_eq!(layers[1].paint["line-color"], json!("rgb(200,0,0)"));
        assert_eq!(layers[1].paint["line-width"], json!(0.46));
    }

    #[test]
    fn test_empty_style() {
        assert!(build_layers(&QmlStyle::Empty, &Outlines::default(), "src").is_empty());
    }
}
