//! Normalisation couleur/opacité des propriétés paint
//!
//! QGIS encode ses couleurs `r,g,b,a`. Le moteur de rendu attend une couleur
//! CSS et une opacité séparée.

use serde_json::{Map, Number, Value};

use crate::types::LayerKind;

/// Sépare une couleur `r,g,b[,a]` en `rgb(r,g,b)` et une opacité `a/255`.
///
/// Les valeurs qui ne sont pas des listes séparées par des virgules
/// (`#ff0000`, `rgb(...)`, expressions) ne sont pas modifiées.
pub fn normalize(paint: &mut Map<String, Value>, color_key: &str, opacity_key: &str) {
    let Some(Value::String(raw)) = paint.get(color_key) else {
        return;
    };
    if raw.starts_with("rgb") || raw.starts_with("hsl") || !raw.contains(',') {
        return;
    }

    let Some((r, g, b, a)) = parse_components(raw) else {
        return;
    };

    let opacity = (a / 255.0 * 1000.0).round() / 1000.0;
    let Some(opacity) = Number::from_f64(opacity) else {
        return;
    };

    paint.insert(
        color_key.to_string(),
        Value::String(format!(
            "rgb({},{},{})",
            format_component(r),
            format_component(g),
            format_component(b)
        )),
    );
    paint.insert(opacity_key.to_string(), Value::Number(opacity));
}

/// Applique la normalisation selon le type de couche
pub fn fix_transparency(kind: LayerKind, paint: &mut Map<String, Value>) {
    match kind {
        LayerKind::Fill => {
            normalize(paint, "fill-color", "fill-opacity");
            // Pas de propriété d'opacité propre au contour de remplissage
            normalize_rgba(paint, "fill-outline-color");
        }
        LayerKind::Line => normalize(paint, "line-color", "line-opacity"),
    }
}

/// Parse `r,g,b[,a]`, alpha à 255 par défaut.
///
/// QGIS >= 3.36 ajoute une représentation flottante après l'alpha
/// (`227,26,28,255,rgb:0.89,0.1,0.11,1`): seules les quatre premières
/// composantes sont lues.
pub(crate) fn parse_components(raw: &str) -> Option<(f64, f64, f64, f64)> {
    let mut parts = raw.split(',').map(|c| {
        fast_float::parse::<f64, _>(c.trim())
            .ok()
            .filter(|v| v.is_finite())
    });

    let r = parts.next()??;
    let g = parts.next()??;
    let b = parts.next()??;
    let a = match parts.next() {
        None => 255.0,
        Some(a) => a?,
    };
    Some((r, g, b, a))
}

/// `35,35,35,255` → `rgba(35,35,35,1)`, alpha arrondi à 3 décimales
pub(crate) fn to_rgba(raw: &str) -> Option<String> {
    let (r, g, b, a) = parse_components(raw)?;
    let alpha = (a / 255.0 * 1000.0).round() / 1000.0;
    Some(format!(
        "rgba({},{},{},{})",
        format_component(r),
        format_component(g),
        format_component(b),
        format_component(alpha)
    ))
}

/// Remplace une couleur `r,g,b[,a]` par sa forme `rgba(...)`, alpha compris
pub fn normalize_rgba(paint: &mut Map<String, Value>, color_key: &str) {
    let Some(Value::String(raw)) = paint.get(color_key) else {
        return;
    };
    if raw.starts_with("rgb") || raw.starts_with("hsl") || !raw.contains(',') {
        return;
    }
    if let Some(rgba) = to_rgba(raw) {
        paint.insert(color_key.to_string(), Value::String(rgba));
    }
}

/// Formate une composante sans décimales inutiles
pub(crate) fn format_component(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paint(value: Value) -> Map<String, Value> {
        let mut paint = Map::new();
        paint.insert("fill-color".to_string(), value);
        paint
    }

    #[test]
    fn test_split_alpha() {
        let mut p = paint(json!("120,80,40,128"));
        normalize(&mut p, "fill-color", "fill-opacity");
        assert_eq!(p["fill-color"], json!("rgb(120,80,40)"));
        assert_eq!(p["fill-opacity"], json!(0.502));
    }

    #[test]
    fn test_alpha_defaults_to_opaque() {
        let mut p = paint(json!("10, 20, 30"));
        normalize(&mut p, "fill-color", "fill-opacity");
        assert_eq!(p["fill-color"], json!("rgb(10,20,30)"));
        assert_eq!(p["fill-opacity"], json!(1.0));
    }

    #[test]
    fn test_css_colors_untouched() {
        for value in [json!("#ff0000"), json!("rgb(1, 2, 3)"), json!(["get", "c"])] {
            let mut p = paint(value.clone());
            normalize(&mut p, "fill-color", "fill-opacity");
            assert_eq!(p["fill-color"], value);
            assert!(!p.contains_key("fill-opacity"));
        }
    }

    #[test]
    fn test_garbage_untouched() {
        let mut p = paint(json!("red,green"));
        normalize(&mut p, "fill-color", "fill-opacity");
        assert_eq!(p["fill-color"], json!("red,green"));
    }

    #[test]
    fn test_qgis_336_color_suffix_ignored() {
        let mut p = paint(json!("227,26,28,128,rgb:0.8901961,0.1019608,0.1098039,0.5019608"));
        normalize(&mut p, "fill-color", "fill-opacity");
        assert_eq!(p["fill-color"], json!("rgb(227,26,28)"));
        assert_eq!(p["fill-opacity"], json!(0.502));
    }

    #[test]
    fn test_invalid_alpha_untouched() {
        let mut p = paint(json!("1,2,3,opaque"));
        normalize(&mut p, "fill-color", "fill-opacity");
        assert_eq!(p["fill-color"], json!("1,2,3,opaque"));
    }

    #[test]
    fn test_fill_outline_color_to_rgba() {
        let mut p = paint(json!("51,160,44,255"));
        p.insert(
            "fill-outline-color".to_string(),
            json!("35,35,35,128,rgb:0.137,0.137,0.137,0.502"),
        );
        fix_transparency(LayerKind::Fill, &mut p);
        assert_eq!(p["fill-outline-color"], json!("rgba(35,35,35,0.502)"));
        assert!(!p.contains_key("fill-outline-opacity"));

        let mut css = paint(json!("#ffffff"));
        css.insert("fill-outline-color".to_string(), json!("#000000"));
        fix_transparency(LayerKind::Fill, &mut css);
        assert_eq!(css["fill-outline-color"], json!("#000000"));
    }

    #[test]
    fn test_fill_and_line_are_independent() {
        let mut p = Map::new();
        p.insert("fill-color".to_string(), json!("255,0,0,255"));
        p.insert("line-color".to_string(), json!("0,0,0,51"));
        fix_transparency(LayerKind::Fill, &mut p);
        assert_eq!(p["fill-color"], json!("rgb(255,0,0)"));
        assert_eq!(p["line-color"], json!("0,0,0,51"));

        fix_transparency(LayerKind::Line, &mut p);
        assert_eq!(p["line-color"], json!("rgb(0,0,0)"));
        assert_eq!(p["line-opacity"], json!(0.2));
    }
}
