//! Traduction des expressions de filtre QGIS (renderer par règles)
//!
//! Seules les comparaisons simples `"champ" op valeur`, éventuellement
//! combinées par `AND`, sont traduites. Le reste devient `Filter::Unsupported`.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::types::{CompareOp, Filter};

fn comparison_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^\s*"([^"]+)"\s*(=|!=|<>|>=|<=|>|<)\s*('(?:[^']|'')*'|-?\d+(?:\.\d+)?)\s*$"#,
        )
        .expect("valid comparison regex")
    })
}

fn and_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s+AND\s+").expect("valid AND regex"))
}

/// Traduit une expression de filtre QGIS
pub fn translate(expression: &str) -> Filter {
    let trimmed = expression.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("ELSE") {
        return Filter::None;
    }

    let parts: Option<Vec<Filter>> = and_regex()
        .split(trimmed)
        .map(translate_comparison)
        .collect();

    match parts {
        Some(mut filters) if filters.len() == 1 => filters.remove(0),
        Some(filters) => Filter::All(filters),
        None => Filter::Unsupported(trimmed.to_string()),
    }
}

fn translate_comparison(expression: &str) -> Option<Filter> {
    let caps = comparison_regex().captures(expression)?;

    let field = caps[1].to_string();
    let op = match &caps[2] {
        "=" => CompareOp::Eq,
        "!=" | "<>" => CompareOp::Ne,
        ">" => CompareOp::Gt,
        ">=" => CompareOp::Ge,
        "<" => CompareOp::Lt,
        "<=" => CompareOp::Le,
        _ => return None,
    };

    let raw = &caps[3];
    let value = if let Some(quoted) = raw.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        Value::from(quoted.replace("''", "'"))
    } else {
        let number = super::qgis::parse_number(raw)?;
        serde_json::Number::from_f64(number).map(Value::Number)?
    };

    Some(Filter::Compare { field, op, value })
}
