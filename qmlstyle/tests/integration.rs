//! Tests d'intégration sur un vrai document QML exporté par QGIS

use std::path::Path;

use serde_json::json;

use qmlstyle::types::LayerKind;
use qmlstyle::{build_layers, QmlStyle, StyleError, DEFAULT_MAX_BYTES};

const FIXTURE: &str = "tests/fixtures/landuse.qml";

#[test]
fn test_load_landuse_style() {
    let result = qmlstyle::load(Path::new(FIXTURE), DEFAULT_MAX_BYTES).unwrap();

    let categories = result.style.categories();
    // Le symbole 2 (marqueur) ne produit aucune catégorie
    let ids: Vec<&str> = categories.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["category-0", "category-1", "category-3"]);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    assert_eq!(
        categories[0].filter,
        Some(json!(["==", ["get", "landuse"], "forest"]))
    );
    // Catégorie « toutes les autres valeurs »: pas de filtre
    assert_eq!(categories[2].filter, None);

    // Deux couches pour le symbole 1 (fill + line)
    let kinds: Vec<LayerKind> = categories[1].layers.iter().map(|l| l.kind).collect();
    assert_eq!(kinds, vec![LayerKind::Fill, LayerKind::Line]);

    // 4 symboles + le source-symbol
    assert_eq!(result.outlines.len(), 5);
    assert!(result.outlines.at(2).is_none());
}

#[test]
fn test_renderer_layers() {
    let result = qmlstyle::load(Path::new(FIXTURE), DEFAULT_MAX_BYTES).unwrap();
    let layers = build_layers(&result.style, &result.outlines, "landuse");

    let ids: Vec<&str> = layers.iter().map(|l| l.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "landuse-0-fill",
            "landuse-1-fill",
            "landuse-1-line",
            "landuse-2-line"
        ]
    );

    // Couleurs QGIS séparées en couleur + opacité
    assert_eq!(layers[0].paint["fill-color"], json!("rgb(51,160,44)"));
    assert_eq!(layers[0].paint["fill-opacity"], json!(1.0));
    assert_eq!(layers[1].paint["fill-color"], json!("rgb(227,26,28)"));
    assert_eq!(layers[1].paint["fill-opacity"], json!(0.502));

    assert_eq!(layers[0].paint["fill-outline-color"], json!("rgba(35,35,35,1)"));

    // Épaisseur corrigée depuis le texte brut, couleur de ligne conservée
    assert_eq!(layers[2].paint["line-width"], json!(1.2));
    assert_eq!(layers[2].paint["line-color"], json!("rgb(128,0,0)"));
    assert_eq!(layers[2].paint["line-dasharray"], json!([4.0, 2.0]));
    assert_eq!(layers[3].paint["line-width"], json!(0.75));
    assert_eq!(layers[3].paint["line-color"], json!("rgb(90,90,90)"));
    assert_eq!(layers[3].filter, json!(["==", "$type", "Polygon"]));
}

#[test]
fn test_malformed_document() {
    let result = qmlstyle::parse_bytes(b"<qgis><renderer-v2></qgis");
    assert!(matches!(result, Err(StyleError::MalformedXml(_))));
}

#[test]
fn test_well_formed_but_not_a_style() {
    let result = qmlstyle::parse("<html><body/></html>");
    assert!(matches!(result, Err(StyleError::InvalidDocument(_))));
}

#[test]
fn test_empty_style_falls_back() {
    let xml = r#"<qgis><renderer-v2 type="categorizedSymbol" attr="a"><categories/><symbols/></renderer-v2></qgis>"#;
    let result = qmlstyle::parse(xml).unwrap();
    assert_eq!(result.style, QmlStyle::Empty);
    assert!(build_layers(&result.style, &result.outlines, "src").is_empty());
}
