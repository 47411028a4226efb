//! Expressions de couleur évaluables

use std::fmt;
use std::str::FromStr;

use geojson::JsonObject;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::error::UnknownOperator;

/// Couleur CSS telle que saisie (`#rrggbb`, `rgb(..)`, nom)
pub type Color = String;

/// Opérateur de comparaison numérique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Comparator {
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

    pub fn compare(self, a: f64, b: f64) -> bool {
        match self {
            Self::Eq => a == b,
            Self::Ne => a != b,
            Self::Gt => a > b,
            Self::Ge => a >= b,
            Self::Lt => a < b,
            Self::Le => a <= b,
        }
    }
}

impl FromStr for Comparator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            other => Err(UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition d'une branche
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `field == value`, égalité stricte (type compris)
    Equals { field: String, value: Value },
    /// `to-number(field_a) op to-number(field_b)`
    Compare {
        field_a: String,
        op: Comparator,
        field_b: String,
    },
}

impl Predicate {
    /// Expression renderer équivalente
    pub fn to_json(&self) -> Value {
        match self {
            Self::Equals { field, value } => json!(["==", ["get", field], value]),
            // `to-number` du renderer vaut 0 sur null et lève une erreur sur
            // un texte non numérique: chaque opérande est vérifié avant
            Self::Compare {
                field_a,
                op,
                field_b,
            } => json!([
                "all",
                numeric_guard(field_a),
                numeric_guard(field_b),
                [
                    op.as_str(),
                    ["to-number", ["get", field_a]],
                    ["to-number", ["get", field_b]]
                ]
            ]),
        }
    }

    /// Évalue la condition sur les propriétés d'une feature
    pub fn matches(&self, properties: &JsonObject) -> bool {
        match self {
            Self::Equals { field, value } => properties.get(field) == Some(value),
            Self::Compare {
                field_a,
                op,
                field_b,
            } => {
                let a = properties.get(field_a).and_then(to_number);
                let b = properties.get(field_b).and_then(to_number);
                match (a, b) {
                    (Some(a), Some(b)) => op.compare(a, b),
                    _ => false,
                }
            }
        }
    }
}

/// Vrai quand `field` a la même lecture numérique que [`to_number`].
///
/// Nombres et booléens passent. Un texte doit contenir un chiffre (ce qui
/// écarte `""` et les blancs, lus 0 par le renderer) et se convertir: avec
/// deux replis différents, `to-number` ne rend la même valeur que si la
/// conversion a réussi.
fn numeric_guard(field: &str) -> Value {
    let value = json!(["get", field]);
    let has_digit: Vec<Value> = std::iter::once(Value::from("any"))
        .chain((0..10).map(|d| json!(["in", d.to_string(), value])))
        .collect();

    json!([
        "match",
        ["typeof", value],
        ["number", "boolean"],
        true,
        "string",
        [
            "all",
            has_digit,
            ["==", ["to-number", value, -1], ["to-number", value, 1]]
        ],
        false
    ])
}

/// Coercition numérique d'une propriété.
///
/// `None` quand la valeur n'a pas de lecture numérique (null, texte non
/// numérique, tableau, objet).
pub fn to_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            fast_float::parse::<f64, _>(s).ok()?
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Expression de couleur d'une couche
#[derive(Debug, Clone, PartialEq)]
pub enum PaintExpression {
    Scalar(Color),
    /// Première branche vérifiée, sinon `fallback`. Jamais vide.
    Conditional {
        branches: Vec<(Predicate, Color)>,
        fallback: Color,
    },
}

impl PaintExpression {
    pub fn is_conditional(&self) -> bool {
        matches!(self, Self::Conditional { .. })
    }

    /// Nombre de branches conditionnelles
    pub fn branch_count(&self) -> usize {
        match self {
            Self::Scalar(_) => 0,
            Self::Conditional { branches, .. } => branches.len(),
        }
    }

    /// `["case", cond, color, ..., fallback]` ou une couleur simple
    pub fn to_json(&self) -> Value {
        match self {
            Self::Scalar(color) => Value::String(color.clone()),
            Self::Conditional { branches, fallback } => {
                let mut expr = Vec::with_capacity(branches.len() * 2 + 2);
                expr.push(Value::from("case"));
                for (predicate, color) in branches {
                    expr.push(predicate.to_json());
                    expr.push(Value::from(color.as_str()));
                }
                expr.push(Value::from(fallback.as_str()));
                Value::Array(expr)
            }
        }
    }

    /// Couleur retenue pour une feature
    pub fn evaluate<'a>(&'a self, properties: &JsonObject) -> &'a str {
        match self {
            Self::Scalar(color) => color.as_str(),
            Self::Conditional { branches, fallback } => branches
                .iter()
                .find(|(predicate, _)| predicate.matches(properties))
                .map_or(fallback.as_str(), |(_, color)| color.as_str()),
        }
    }
}

impl Serialize for PaintExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
