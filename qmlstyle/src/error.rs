//! Types d'erreurs pour le crate qmlstyle

use thiserror::Error;

/// Erreurs fatales pour le chargement d'un style QML
#[derive(Debug, Error)]
pub enum StyleError {
    /// Erreur d'I/O lors de la lecture du fichier
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Le document n'est pas du XML bien formé (rejeté avant le parsing)
    #[error("Malformed XML: {0}")]
    MalformedXml(String),

    /// Le document XML ne contient pas de style QGIS exploitable
    #[error("Invalid QML document: {0}")]
    InvalidDocument(String),

    /// Extension de fichier non supportée
    #[error("Unsupported file: {0} (expected a .qml file)")]
    UnsupportedFile(String),

    /// Fichier trop volumineux
    #[error("Style file too large: {size} bytes (max {max})")]
    TooLarge { size: u64, max: u64 },
}

impl StyleError {
    /// Crée une erreur de document invalide
    pub fn invalid_document(reason: impl Into<String>) -> Self {
        Self::InvalidDocument(reason.into())
    }
}

/// Erreur de conversion d'une règle isolée (phase 3)
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Cannot convert {kind} symbolizer: {reason}")]
pub struct ConversionError {
    pub kind: &'static str,
    pub reason: String,
}

impl ConversionError {
    pub fn new(kind: &'static str, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// Problèmes non fataux rencontrés pendant le parsing
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StyleWarning {
    /// Une règle n'a pas pu être convertie et a été ignorée
    #[error("Rule {index} ({name}) skipped: {source}")]
    RuleConversion {
        index: usize,
        name: String,
        #[source]
        source: ConversionError,
    },

    /// Filtre de règle non traduisible: la règle est conservée sans filtre
    #[error("Rule {index}: unsupported filter expression `{expression}`")]
    UnsupportedFilter { index: usize, expression: String },
}
