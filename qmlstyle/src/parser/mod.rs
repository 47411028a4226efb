//! Parsing des documents QML en trois phases
//!
//! 1. QML → style intermédiaire (`qgis`)
//! 2. Filtrage des symbolizers supportés (fill, line)
//! 3. Conversion règle par règle vers les couches du moteur de rendu (`layer`)

pub mod filter;
pub mod layer;
pub mod qgis;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::types::{Category, QmlStyle, Rule};
use crate::{StyleError, StyleWarning};

/// Convertit un document QML en style catégorisé.
///
/// Seul l'échec de la phase 1 est une erreur; les règles non convertibles
/// sont ignorées et reportées dans les warnings.
pub fn parse(xml: &str) -> Result<(QmlStyle, Vec<StyleWarning>), StyleError> {
    let geo_style = qgis::read_style(xml)?;
    let mut warnings = Vec::new();

    // Phase 2: ne garder que fill/line, l'index d'origine est conservé
    let rules: Vec<(usize, Rule)> = geo_style
        .rules
        .into_iter()
        .enumerate()
        .filter_map(|(index, mut rule)| {
            rule.symbolizers.retain(|s| s.is_supported());
            if rule.symbolizers.is_empty() {
                debug!(index, name = %rule.name, "Règle sans symbolizer supporté, ignorée");
                None
            } else {
                Some((index, rule))
            }
        })
        .collect();

    for (index, rule) in &rules {
        if let Some(expression) = rule.filter.unsupported() {
            warnings.push(StyleWarning::UnsupportedFilter {
                index: *index,
                expression: expression.to_string(),
            });
        }
    }

    // Phase 3: conversion isolée par règle, l'ordre est préservé par collect
    let converted: Vec<Result<Category, StyleWarning>> = rules
        .par_iter()
        .map(|(index, rule)| {
            layer::write_layers(&rule.symbolizers)
                .map(|layers| Category {
                    id: format!("category-{}", index),
                    index: *index,
                    symbol: rule.symbol.clone(),
                    filter: rule.filter.to_expression(),
                    layers,
                })
                .map_err(|source| StyleWarning::RuleConversion {
                    index: *index,
                    name: rule.name.clone(),
                    source,
                })
        })
        .collect();

    let mut categories = Vec::with_capacity(converted.len());
    for result in converted {
        match result {
            Ok(category) if category.layers.is_empty() => continue,
            Ok(category) => categories.push(category),
            Err(warning) => {
                warn!(%warning, "Erreur de conversion de règle");
                warnings.push(warning);
            }
        }
    }

    debug!(
        categories = categories.len(),
        warnings = warnings.len(),
        "Style QML converti"
    );

    let style = if categories.is_empty() {
        QmlStyle::Empty
    } else {
        QmlStyle::Categorized(categories)
    };

    Ok((style, warnings))
}
