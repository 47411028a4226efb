//! Conversion des symbolizers vers les couches du moteur de rendu (phase 3)

use serde_json::{Map, Value};

use crate::types::{FillSymbolizer, LayerKind, LineSymbolizer, StyleLayer, Symbolizer};
use crate::ConversionError;

/// Épaisseur de ligne QGIS par défaut
const DEFAULT_LINE_WIDTH: f64 = 0.26;

/// Convertit les symbolizers d'une règle en couches.
///
/// Une erreur invalide toute la règle, jamais le style entier.
pub fn write_layers(symbolizers: &[Symbolizer]) -> Result<Vec<StyleLayer>, ConversionError> {
    symbolizers
        .iter()
        .filter_map(|symbolizer| match symbolizer {
            Symbolizer::Fill(fill) => Some(write_fill(fill)),
            Symbolizer::Line(line) => Some(write_line(line)),
            Symbolizer::Mark(_) => None,
        })
        .collect()
}

fn write_fill(fill: &FillSymbolizer) -> Result<StyleLayer, ConversionError> {
    let mut paint = Map::new();

    let color = check_color("fill", fill.color.as_deref())?;
    paint.insert("fill-color".into(), color.into());
    paint.insert("fill-opacity".into(), number("fill", "opacity", fill.opacity, 0.0..=1.0)?);

    if let Some(outline) = fill.outline_color.as_deref() {
        paint.insert(
            "fill-outline-color".into(),
            check_color("fill", Some(outline))?.into(),
        );
    }

    Ok(StyleLayer {
        kind: LayerKind::Fill,
        paint,
        layout: Map::new(),
    })
}

fn write_line(line: &LineSymbolizer) -> Result<StyleLayer, ConversionError> {
    let mut paint = Map::new();
    let mut layout = Map::new();

    let color = check_color("line", line.color.as_deref())?;
    paint.insert("line-color".into(), color.into());
    paint.insert(
        "line-width".into(),
        number(
            "line",
            "width",
            line.width.unwrap_or(DEFAULT_LINE_WIDTH),
            0.0..=f64::MAX,
        )?,
    );
    paint.insert("line-opacity".into(), number("line", "opacity", line.opacity, 0.0..=1.0)?);

    if let Some(dash) = &line.dash {
        let values: Result<Vec<Value>, _> = dash
            .iter()
            .map(|d| number("line", "dash", *d, 0.0..=f64::MAX))
            .collect();
        paint.insert("line-dasharray".into(), Value::Array(values?));
    }

    if let Some(cap) = &line.cap {
        layout.insert("line-cap".into(), cap.clone().into());
    }
    if let Some(join) = &line.join {
        layout.insert("line-join".into(), join.clone().into());
    }

    Ok(StyleLayer {
        kind: LayerKind::Line,
        paint,
        layout,
    })
}

fn check_color<'a>(kind: &'static str, color: Option<&'a str>) -> Result<&'a str, ConversionError> {
    match color.map(str::trim) {
        Some(c) if !c.is_empty() => Ok(c),
        _ => Err(ConversionError::new(kind, "missing color")),
    }
}

fn number(
    kind: &'static str,
    name: &str,
    value: f64,
    range: std::ops::RangeInclusive<f64>,
) -> Result<Value, ConversionError> {
    if !range.contains(&value) {
        return Err(ConversionError::new(
            kind,
            format!("{} out of range: {}", name, value),
        ));
    }
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| ConversionError::new(kind, format!("{} is not finite", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MarkSymbolizer;
    use serde_json::json;

    fn fill(color: Option<&str>) -> Symbolizer {
        Symbolizer::Fill(FillSymbolizer {
            color: color.map(str::to_string),
            opacity: 1.0,
            outline_color: Some("35,35,35,255".to_string()),
            outline_width: Some(0.26),
        })
    }

    #[test]
    fn test_write_fill() {
        let layers = write_layers(&[fill(Some("227,26,28,255"))]).unwrap();
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].kind, LayerKind::Fill);
        assert_eq!(layers[0].paint["fill-color"], json!("227,26,28,255"));
        assert_eq!(layers[0].paint["fill-outline-color"], json!("35,35,35,255"));
    }

    #[test]
    fn test_write_line_defaults() {
        let line = Symbolizer::Line(LineSymbolizer {
            color: Some("#112233".to_string()),
            opacity: 0.5,
            width: None,
            dash: Some(vec![4.0, 2.0]),
            cap: Some("round".to_string()),
            join: None,
        });
        let layers = write_layers(&[line]).unwrap();
        assert_eq!(layers[0].paint["line-width"], json!(DEFAULT_LINE_WIDTH));
        assert_eq!(layers[0].paint["line-dasharray"], json!([4.0, 2.0]));
        assert_eq!(layers[0].layout["line-cap"], json!("round"));
    }

    #[test]
    fn test_marks_are_ignored() {
        let mark = Symbolizer::Mark(MarkSymbolizer {
            shape: "circle".to_string(),
            color: None,
            size: None,
        });
        assert!(write_layers(&[mark]).unwrap().is_empty());
    }

    #[test]
    fn test_missing_color_fails_rule() {
        let err = write_layers(&[fill(Some("1,2,3,255")), fill(None)]).unwrap_err();
        assert_eq!(err.kind, "fill");
    }

    #[test]
    fn test_opacity_out_of_range() {
        let bad = Symbolizer::Fill(FillSymbolizer {
            color: Some("#fff".to_string()),
            opacity: 1.5,
            outline_color: None,
            outline_width: None,
        });
        assert!(write_layers(&[bad]).is_err());
    }
}
