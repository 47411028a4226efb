//! Validation permissive du XML avant parsing

use crate::parser::qgis::parsing_options;
use crate::StyleError;

/// Vérifie que le contenu est du XML bien formé, sans rien exiger du schéma
pub fn is_well_formed(content: &str) -> bool {
    ensure_well_formed(content).is_ok()
}

/// Comme [`is_well_formed`], avec le message du parseur XML
pub fn ensure_well_formed(content: &str) -> Result<(), StyleError> {
    if content.trim().is_empty() {
        return Err(StyleError::MalformedXml("empty document".to_string()));
    }
    roxmltree::Document::parse_with_options(content, parsing_options())
        .map(|_| ())
        .map_err(|e| StyleError::MalformedXml(e.to_string()))
}
