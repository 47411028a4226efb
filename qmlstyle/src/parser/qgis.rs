//! Lecture du dialecte QML de QGIS vers le style intermédiaire (phase 1)

use std::collections::HashMap;

use roxmltree::{Document, Node};
use tracing::debug;

use super::filter;
use crate::types::{
    CompareOp, FillSymbolizer, Filter, GeoStyle, LineSymbolizer, MarkSymbolizer, RendererMode,
    Rule, Symbolizer,
};
use crate::StyleError;

/// Propriétés d'une couche de symbole (`<prop k v>` ou `<Option name value>`)
type Props = HashMap<String, String>;

/// Options de parsing: les QML commencent par un `<!DOCTYPE qgis ...>`
pub(crate) fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    }
}

/// Parse un document QML en style intermédiaire
pub fn read_style(xml: &str) -> Result<GeoStyle, StyleError> {
    let doc = Document::parse_with_options(xml, parsing_options())
        .map_err(|e| StyleError::invalid_document(e.to_string()))?;
    let root = doc.root_element();

    if !root.has_tag_name("qgis") {
        return Err(StyleError::invalid_document(format!(
            "expected root element 'qgis', found '{}'",
            root.tag_name().name()
        )));
    }

    let renderer = root
        .children()
        .find(|n| n.has_tag_name("renderer-v2"))
        .ok_or_else(|| StyleError::invalid_document("no <renderer-v2> element"))?;

    let symbols = read_symbols(&renderer);
    let renderer_type = renderer.attribute("type").unwrap_or_default();
    let attribute = renderer.attribute("attr").unwrap_or_default().to_string();

    let (mode, rules) = match renderer_type {
        "singleSymbol" => (RendererMode::SingleSymbol, single_symbol_rules(&symbols)),
        "categorizedSymbol" => (
            RendererMode::Categorized {
                attribute: attribute.clone(),
            },
            categorized_rules(&renderer, &attribute, &symbols),
        ),
        "graduatedSymbol" => (
            RendererMode::Graduated {
                attribute: attribute.clone(),
            },
            graduated_rules(&renderer, &attribute, &symbols),
        ),
        "RuleRenderer" => (RendererMode::RuleBased, rule_based_rules(&renderer, &symbols)),
        other => {
            return Err(StyleError::invalid_document(format!(
                "unsupported renderer type '{}'",
                other
            )))
        }
    };

    debug!(
        renderer = renderer_type,
        symbols = symbols.len(),
        rules = rules.len(),
        "QML renderer lu"
    );

    Ok(GeoStyle {
        name: root.attribute("version").unwrap_or("qgis").to_string(),
        mode,
        rules,
    })
}

/// Lit les symboles `<symbols><symbol name="..">` du renderer
fn read_symbols(renderer: &Node) -> HashMap<String, Vec<Symbolizer>> {
    let mut symbols = HashMap::new();

    let Some(container) = renderer.children().find(|n| n.has_tag_name("symbols")) else {
        return symbols;
    };

    for symbol in container.children().filter(|n| n.has_tag_name("symbol")) {
        let Some(name) = symbol.attribute("name") else {
            continue;
        };
        symbols.insert(name.to_string(), read_symbol(&symbol));
    }

    symbols
}

/// Convertit les couches d'un `<symbol>` en symbolizers
fn read_symbol(symbol: &Node) -> Vec<Symbolizer> {
    let alpha = symbol
        .attribute("alpha")
        .and_then(parse_number)
        .unwrap_or(1.0);

    symbol
        .children()
        .filter(|n| n.has_tag_name("layer"))
        .filter(|layer| layer.attribute("enabled") != Some("0"))
        .filter_map(|layer| {
            let class = layer.attribute("class").unwrap_or_default();
            let props = read_props(&layer);
            symbolizer_from_layer(class, &props, alpha)
        })
        .collect()
}

/// Collecte les propriétés d'une couche, ancien et nouveau format confondus
fn read_props(layer: &Node) -> Props {
    let mut props = Props::new();

    for child in layer.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "prop" => {
                if let (Some(k), Some(v)) = (child.attribute("k"), child.attribute("v")) {
                    props.insert(k.to_string(), v.to_string());
                }
            }
            // QGIS >= 3.26: <Option type="Map"><Option name=".." value=".."/></Option>
            "Option" => {
                for option in child.children().filter(|n| n.has_tag_name("Option")) {
                    if let (Some(name), Some(value)) =
                        (option.attribute("name"), option.attribute("value"))
                    {
                        props.insert(name.to_string(), value.to_string());
                    }
                }
            }
            _ => {}
        }
    }

    props
}

fn symbolizer_from_layer(class: &str, props: &Props, alpha: f64) -> Option<Symbolizer> {
    match class {
        "SimpleFill" => {
            let brush_none = props.get("style").map(String::as_str) == Some("no");
            let pen_none = props.get("outline_style").map(String::as_str) == Some("no");
            Some(Symbolizer::Fill(FillSymbolizer {
                color: props.get("color").cloned(),
                opacity: if brush_none { 0.0 } else { alpha },
                outline_color: if pen_none {
                    None
                } else {
                    props.get("outline_color").cloned()
                },
                outline_width: if pen_none {
                    None
                } else {
                    props.get("outline_width").and_then(|v| parse_number(v))
                },
            }))
        }
        "SimpleLine" => {
            let line_style = props.get("line_style").map(String::as_str).unwrap_or("solid");
            let custom_dash = props.get("use_custom_dash").map(String::as_str) == Some("1");
            let dash = if custom_dash {
                props.get("customdash").and_then(|v| parse_dash(v))
            } else {
                dash_for_style(line_style)
            };
            Some(Symbolizer::Line(LineSymbolizer {
                color: props
                    .get("line_color")
                    .or_else(|| props.get("color"))
                    .cloned(),
                opacity: if line_style == "no" { 0.0 } else { alpha },
                width: props
                    .get("line_width")
                    .or_else(|| props.get("width"))
                    .and_then(|v| parse_number(v)),
                dash,
                cap: props.get("capstyle").map(|c| cap_style(c).to_string()),
                join: props.get("joinstyle").cloned(),
            }))
        }
        "SimpleMarker" | "SvgMarker" | "FontMarker" | "EllipseMarker" => {
            Some(Symbolizer::Mark(MarkSymbolizer {
                shape: props.get("name").cloned().unwrap_or_else(|| "circle".to_string()),
                color: props.get("color").cloned(),
                size: props.get("size").and_then(|v| parse_number(v)),
            }))
        }
        _ => None,
    }
}

fn single_symbol_rules(symbols: &HashMap<String, Vec<Symbolizer>>) -> Vec<Rule> {
    let symbolizers = symbols.get("0").cloned().unwrap_or_default();
    vec![Rule {
        name: "Single symbol".to_string(),
        symbol: Some("0".to_string()),
        filter: Filter::None,
        symbolizers,
    }]
}

fn categorized_rules(
    renderer: &Node,
    attribute: &str,
    symbols: &HashMap<String, Vec<Symbolizer>>,
) -> Vec<Rule> {
    let Some(categories) = renderer.children().find(|n| n.has_tag_name("categories")) else {
        return Vec::new();
    };

    categories
        .children()
        .filter(|n| n.has_tag_name("category"))
        .filter(|n| n.attribute("render") != Some("false"))
        .map(|category| {
            let value = category.attribute("value").unwrap_or_default();
            // Valeur vide ou NULL: catégorie « toutes les autres valeurs »
            let filter = if value.is_empty() || value == "NULL" {
                Filter::None
            } else {
                Filter::Compare {
                    field: attribute.to_string(),
                    op: CompareOp::Eq,
                    value: value.into(),
                }
            };
            rule_for_symbol(
                category.attribute("label").unwrap_or(value),
                category.attribute("symbol"),
                filter,
                symbols,
            )
        })
        .collect()
}

fn graduated_rules(
    renderer: &Node,
    attribute: &str,
    symbols: &HashMap<String, Vec<Symbolizer>>,
) -> Vec<Rule> {
    let Some(ranges) = renderer.children().find(|n| n.has_tag_name("ranges")) else {
        return Vec::new();
    };

    ranges
        .children()
        .filter(|n| n.has_tag_name("range"))
        .filter(|n| n.attribute("render") != Some("false"))
        .map(|range| {
            let lower = range.attribute("lower").and_then(parse_number);
            let upper = range.attribute("upper").and_then(parse_number);
            let filter = match (lower, upper) {
                (Some(lower), Some(upper)) => Filter::Range {
                    field: attribute.to_string(),
                    lower,
                    upper,
                },
                _ => Filter::Unsupported(format!(
                    "range {:?}..{:?}",
                    range.attribute("lower"),
                    range.attribute("upper")
                )),
            };
            rule_for_symbol(
                range.attribute("label").unwrap_or_default(),
                range.attribute("symbol"),
                filter,
                symbols,
            )
        })
        .collect()
}

fn rule_based_rules(renderer: &Node, symbols: &HashMap<String, Vec<Symbolizer>>) -> Vec<Rule> {
    let Some(root_rules) = renderer.children().find(|n| n.has_tag_name("rules")) else {
        return Vec::new();
    };

    let mut rules = Vec::new();
    for rule in root_rules.children().filter(|n| n.has_tag_name("rule")) {
        collect_rules(&rule, &Filter::None, symbols, &mut rules);
    }
    rules
}

/// Aplatit une règle et ses enfants dans l'ordre du document.
///
/// Un enfant ne s'applique qu'aux features retenues par son parent: son
/// filtre est la conjonction des filtres de ses ancêtres et du sien. Une
/// règle désactivée masque tout son sous-arbre.
fn collect_rules(
    rule: &Node,
    inherited: &Filter,
    symbols: &HashMap<String, Vec<Symbolizer>>,
    rules: &mut Vec<Rule>,
) {
    if rule.attribute("checkstate") == Some("0") {
        return;
    }

    let own = filter::translate(rule.attribute("filter").unwrap_or_default());
    let combined = Filter::all([inherited.clone(), own]);

    if let Some(symbol) = rule.attribute("symbol") {
        rules.push(rule_for_symbol(
            rule.attribute("label").unwrap_or_default(),
            Some(symbol),
            combined.clone(),
            symbols,
        ));
    }

    for child in rule.children().filter(|n| n.has_tag_name("rule")) {
        collect_rules(&child, &combined, symbols, rules);
    }
}

fn rule_for_symbol(
    label: &str,
    symbol: Option<&str>,
    filter: Filter,
    symbols: &HashMap<String, Vec<Symbolizer>>,
) -> Rule {
    let symbolizers = symbol
        .and_then(|name| symbols.get(name))
        .cloned()
        .unwrap_or_default();

    Rule {
        name: label.to_string(),
        symbol: symbol.map(str::to_string),
        filter,
        symbolizers,
    }
}

/// Parse un nombre QML (`fast-float`, tolère les espaces)
pub(crate) fn parse_number(value: &str) -> Option<f64> {
    fast_float::parse::<f64, _>(value.trim())
        .ok()
        .filter(|v| v.is_finite())
}

/// Motif personnalisé `5;2` (séparé par `;`)
fn parse_dash(value: &str) -> Option<Vec<f64>> {
    let dash: Option<Vec<f64>> = value.split(';').map(parse_number).collect();
    dash.filter(|d| !d.is_empty())
}

fn dash_for_style(line_style: &str) -> Option<Vec<f64>> {
    match line_style {
        "dash" => Some(vec![4.0, 2.0]),
        "dot" => Some(vec![1.0, 2.0]),
        "dash dot" => Some(vec![4.0, 2.0, 1.0, 2.0]),
        "dash dot dot" => Some(vec![4.0, 2.0, 1.0, 2.0, 1.0, 2.0]),
        _ => None,
    }
}

fn cap_style(qgis: &str) -> &str {
    match qgis {
        "flat" => "butt",
        other => other,
    }
}
