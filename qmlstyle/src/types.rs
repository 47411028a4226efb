//! Types de données pour le crate qmlstyle

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::outline::Outlines;
use crate::StyleWarning;

/// Style intermédiaire, indépendant du moteur de rendu (sortie de la phase 1)
#[derive(Debug, Clone, PartialEq)]
pub struct GeoStyle {
    /// Nom du style (attribut `version` du document si absent)
    pub name: String,

    /// Mode du renderer QGIS
    pub mode: RendererMode,

    /// Règles dans l'ordre du document
    pub rules: Vec<Rule>,
}

/// Mode de rendu déclaré par `<renderer-v2 type="...">`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererMode {
    /// Symbole unique
    SingleSymbol,
    /// Catégorisé sur un attribut
    Categorized { attribute: String },
    /// Gradué (plages numériques) sur un attribut
    Graduated { attribute: String },
    /// Ensemble de règles avec expressions QGIS
    RuleBased,
}

/// Une règle: un filtre et ses symbolizers
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Libellé de la règle
    pub name: String,

    /// Nom du symbole référencé dans `<symbols>`
    pub symbol: Option<String>,

    /// Filtre de sélection des features
    pub filter: Filter,

    /// Instructions de dessin
    pub symbolizers: Vec<Symbolizer>,
}

/// Filtre d'une règle
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Toutes les features
    None,
    /// Comparaison d'un champ à une valeur
    Compare {
        field: String,
        op: CompareOp,
        value: Value,
    },
    /// Plage fermée `[lower, upper]`
    Range { field: String, lower: f64, upper: f64 },
    /// Conjonction de filtres
    All(Vec<Filter>),
    /// Expression QGIS non traduisible
    Unsupported(String),
}

/// Opérateurs de comparaison des filtres
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    /// Symbole de l'opérateur dans les expressions du moteur de rendu
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        }
    }
}

impl Filter {
    /// Conjonction de filtres, `None` ignorés et `All` aplatis
    pub fn all(filters: impl IntoIterator<Item = Filter>) -> Filter {
        let mut parts = Vec::new();
        for filter in filters {
            match filter {
                Filter::None => {}
                Filter::All(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Filter::None,
            1 => parts.pop().unwrap_or(Filter::None),
            _ => Filter::All(parts),
        }
    }

    /// Première expression non traduite, y compris dans une conjonction
    pub fn unsupported(&self) -> Option<&str> {
        match self {
            Filter::Unsupported(expression) => Some(expression),
            Filter::All(filters) => filters.iter().find_map(Filter::unsupported),
            _ => None,
        }
    }

    /// Convertit le filtre en expression du moteur de rendu.
    ///
    /// `None` signifie « pas de filtre »: l'appelant applique son filtre par défaut.
    pub fn to_expression(&self) -> Option<Value> {
        match self {
            Filter::None | Filter::Unsupported(_) => None,
            Filter::Compare { field, op, value } => {
                Some(json!([op.as_str(), ["get", field], value]))
            }
            Filter::Range {
                field,
                lower,
                upper,
            } => Some(json!([
                "all",
                [">=", ["get", field], lower],
                ["<=", ["get", field], upper]
            ])),
            Filter::All(filters) => {
                let parts: Vec<Value> = filters.iter().filter_map(Filter::to_expression).collect();
                match parts.len() {
                    0 => None,
                    1 => parts.into_iter().next(),
                    _ => {
                        let mut expr = vec![Value::from("all")];
                        expr.extend(parts);
                        Some(Value::Array(expr))
                    }
                }
            }
        }
    }
}

/// Type de symbolizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolizerKind {
    Fill,
    Line,
    Mark,
}

/// Instruction de dessin pour un type de géométrie
#[derive(Debug, Clone, PartialEq)]
pub enum Symbolizer {
    Fill(FillSymbolizer),
    Line(LineSymbolizer),
    Mark(MarkSymbolizer),
}

impl Symbolizer {
    pub fn kind(&self) -> SymbolizerKind {
        match self {
            Self::Fill(_) => SymbolizerKind::Fill,
            Self::Line(_) => SymbolizerKind::Line,
            Self::Mark(_) => SymbolizerKind::Mark,
        }
    }

    /// Seuls les remplissages et les lignes sont rendus
    pub fn is_supported(&self) -> bool {
        matches!(self.kind(), SymbolizerKind::Fill | SymbolizerKind::Line)
    }
}

/// Remplissage de polygone (`SimpleFill`)
#[derive(Debug, Clone, PartialEq)]
pub struct FillSymbolizer {
    /// Couleur brute telle que lue dans le QML (souvent `r,g,b,a`)
    pub color: Option<String>,
    /// Opacité du symbole (attribut `alpha`)
    pub opacity: f64,
    /// Couleur de contour brute
    pub outline_color: Option<String>,
    /// Épaisseur de contour
    pub outline_width: Option<f64>,
}

/// Ligne (`SimpleLine`)
#[derive(Debug, Clone, PartialEq)]
pub struct LineSymbolizer {
    pub color: Option<String>,
    pub opacity: f64,
    pub width: Option<f64>,
    /// Motif de tirets
    pub dash: Option<Vec<f64>>,
    pub cap: Option<String>,
    pub join: Option<String>,
}

/// Marqueur ponctuel, reconnu mais non rendu
#[derive(Debug, Clone, PartialEq)]
pub struct MarkSymbolizer {
    pub shape: String,
    pub color: Option<String>,
    pub size: Option<f64>,
}

/// Type de couche du moteur de rendu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Fill,
    Line,
}

impl LayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::Line => "line",
        }
    }
}

/// Couche convertie (propriétés paint/layout du moteur de rendu)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleLayer {
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub paint: Map<String, Value>,
    pub layout: Map<String, Value>,
}

/// Une catégorie du style final
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    /// Identifiant `category-{index}`
    pub id: String,

    /// Position de la règle dans le document
    pub index: usize,

    /// Symbole QML d'origine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    /// Filtre du moteur de rendu
    pub filter: Option<Value>,

    /// Couches à ajouter
    pub layers: Vec<StyleLayer>,
}

/// Style prêt pour le moteur de rendu
#[derive(Debug, Clone, Default, PartialEq)]
pub enum QmlStyle {
    /// Aucune règle exploitable: symbologie par défaut
    #[default]
    Empty,
    /// Catégories dans l'ordre du document
    Categorized(Vec<Category>),
}

impl QmlStyle {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn categories(&self) -> &[Category] {
        match self {
            Self::Empty => &[],
            Self::Categorized(categories) => categories,
        }
    }
}

/// Résultat du parsing d'un document QML
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Style catégorisé
    pub style: QmlStyle,

    /// Corrections de contour extraites du texte brut
    pub outlines: Outlines,

    /// Problèmes non fatals rencontrés
    pub warnings: Vec<StyleWarning>,
}
