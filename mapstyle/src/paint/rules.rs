//! Règles de coloration saisies par l'utilisateur

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use super::expression::{Color, Comparator, Predicate};

/// Couleur attribuée aux nouvelles catégories
pub const DEFAULT_CATEGORY_COLOR: &str = "#cccccc";

/// Couleur d'une règle, ou la couleur de base si elle est vide
fn color_or(color: &str, base: &str) -> Color {
    if color.trim().is_empty() {
        base.to_string()
    } else {
        color.to_string()
    }
}

/// Coloration d'un champ booléen: deux branches `== true` / `== false`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BooleanRule {
    pub field: String,
    pub true_color: Color,
    pub false_color: Color,
    pub enabled: bool,
}

impl BooleanRule {
    /// Règle désactivée avec les couleurs par défaut (vert / rouge)
    pub fn disabled(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            true_color: "#00ff00".to_string(),
            false_color: "#ff0000".to_string(),
            enabled: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.enabled && !self.field.trim().is_empty()
    }

    pub(crate) fn branches(&self, base: &str) -> [(Predicate, Color); 2] {
        let when = |value: bool| Predicate::Equals {
            field: self.field.clone(),
            value: serde_json::Value::Bool(value),
        };
        [
            (when(true), color_or(&self.true_color, base)),
            (when(false), color_or(&self.false_color, base)),
        ]
    }
}

/// Coloration d'un champ texte par valeur, dans l'ordre de saisie
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoricalRule {
    pub field: String,
    #[serde(with = "ordered_pairs")]
    pub values: Vec<(String, Color)>,
}

impl CategoricalRule {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            values: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.field.trim().is_empty()
    }

    pub fn color_for(&self, value: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, c)| c.as_str())
    }

    /// Aligne les catégories sur les valeurs observées.
    ///
    /// Les couleurs déjà choisies sont conservées, les nouvelles valeurs
    /// reçoivent [`DEFAULT_CATEGORY_COLOR`], les valeurs disparues sont
    /// retirées. Retourne `false` si l'ensemble des clés est inchangé.
    pub fn sync_values(&mut self, observed: &[String]) -> bool {
        let same = observed.len() == self.values.len()
            && observed.iter().all(|v| self.color_for(v).is_some());
        if same {
            return false;
        }

        self.values = observed
            .iter()
            .map(|v| {
                let color = self.color_for(v).unwrap_or(DEFAULT_CATEGORY_COLOR);
                (v.clone(), color.to_string())
            })
            .collect();
        true
    }

    pub(crate) fn branches<'a>(
        &'a self,
        base: &'a str,
    ) -> impl Iterator<Item = (Predicate, Color)> + 'a {
        self.values.iter().map(move |(value, color)| {
            (
                Predicate::Equals {
                    field: self.field.clone(),
                    value: serde_json::Value::String(value.clone()),
                },
                color_or(color, base),
            )
        })
    }
}

/// Comparaison de deux champs numériques
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NumericRule {
    pub field_a: String,
    /// Un des six comparateurs; tout autre texte invalide la règle
    pub op: String,
    pub field_b: String,
    pub color: Color,
}

impl NumericRule {
    pub fn comparator(&self) -> Option<Comparator> {
        self.op.trim().parse().ok()
    }

    pub fn is_valid(&self) -> bool {
        !self.field_a.trim().is_empty()
            && !self.field_b.trim().is_empty()
            && self.comparator().is_some()
    }

    pub(crate) fn branch(&self, base: &str) -> Option<(Predicate, Color)> {
        if self.field_a.trim().is_empty() || self.field_b.trim().is_empty() {
            return None;
        }
        let op = self.comparator()?;
        Some((
            Predicate::Compare {
                field_a: self.field_a.clone(),
                op,
                field_b: self.field_b.clone(),
            },
            color_or(&self.color, base),
        ))
    }
}

/// `Vec<(clé, valeur)>` sérialisé comme objet JSON ordonné
mod ordered_pairs {
    use super::*;

    pub fn serialize<S: Serializer>(pairs: &[(String, String)], s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(pairs.len()))?;
        for (k, v) in pairs {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<(String, String)>, D::Error> {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(d)?;
        map.into_iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(color) => Ok((k, color)),
                serde_json::Value::Null => Ok((k, String::new())),
                other => Err(<D::Error as de::Error>::custom(format!(
                    "category '{}': expected a color string, got {}",
                    k, other
                ))),
            })
            .collect()
    }
}

/// Règles booléennes: liste, ou objet `{champ: {enabled, trueColor, falseColor}}`
pub(crate) fn deserialize_boolean_rules<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Vec<BooleanRule>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        List(Vec<BooleanRule>),
        Map(serde_json::Map<String, serde_json::Value>),
    }

    match Repr::deserialize(d)? {
        Repr::List(rules) => Ok(rules),
        Repr::Map(map) => map
            .into_iter()
            .map(|(field, cfg)| -> Result<BooleanRule, D::Error> {
                let mut rule: BooleanRule =
                    serde_json::from_value(cfg).map_err(<D::Error as de::Error>::custom)?;
                rule.field = field;
                Ok(rule)
            })
            .collect(),
    }
}
