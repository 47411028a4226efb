//! Expressions de couleur construites à partir des règles utilisateur
//!
//! Trois familles de règles, dans cet ordre de priorité:
//! 1. booléennes: `champ == true` puis `champ == false`
//! 2. catégorielles: `champ == valeur`, dans l'ordre de saisie
//! 3. numériques: `to-number(a) op to-number(b)`
//!
//! La première branche vérifiée l'emporte, sinon la couleur de base.

mod expression;
mod layer;
mod rules;

pub use expression::{to_number, Color, Comparator, PaintExpression, Predicate};
pub use layer::{LayerPaint, LayerStyle};
pub use rules::{BooleanRule, CategoricalRule, NumericRule, DEFAULT_CATEGORY_COLOR};

use tracing::trace;

/// Couleur de repli quand la couleur de base est vide
pub const FALLBACK_COLOR: &str = "#cccccc";

/// Fusionne les règles en une expression.
///
/// Les règles incomplètes (champ vide, opérateur inconnu, règle booléenne
/// désactivée) sont ignorées sans erreur. Sans aucune branche, le résultat
/// est [`PaintExpression::Scalar`].
pub fn build(
    boolean: &[BooleanRule],
    categorical: Option<&CategoricalRule>,
    numeric: &[NumericRule],
    base_color: &str,
) -> PaintExpression {
    let base = if base_color.trim().is_empty() {
        FALLBACK_COLOR
    } else {
        base_color
    };

    let mut branches = Vec::new();

    for rule in boolean {
        if rule.is_valid() {
            branches.extend(rule.branches(base));
        } else {
            trace!(field = %rule.field, enabled = rule.enabled, "Règle booléenne ignorée");
        }
    }

    match categorical {
        Some(rule) if rule.is_valid() => branches.extend(rule.branches(base)),
        Some(_) => trace!("Règle catégorielle sans champ ignorée"),
        None => {}
    }

    for rule in numeric {
        match rule.branch(base) {
            Some(branch) => branches.push(branch),
            None => trace!(
                field_a = %rule.field_a,
                op = %rule.op,
                field_b = %rule.field_b,
                "Règle numérique ignorée"
            ),
        }
    }

    if branches.is_empty() {
        return PaintExpression::Scalar(base.to_string());
    }

    PaintExpression::Conditional {
        branches,
        fallback: base.to_string(),
    }
}
