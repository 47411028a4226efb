//! Types d'erreurs pour les documents géographiques

use thiserror::Error;

/// Erreurs de chargement d'un document GeoJSON
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Fichier vide
    #[error("Empty document")]
    Empty,

    /// Contenu non UTF-8
    #[error("Document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// JSON invalide
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Champ `type` absent
    #[error("Missing 'type' member")]
    MissingType,

    /// Type GeoJSON inconnu
    #[error("Unknown GeoJSON type: {0}")]
    UnknownType(String),

    /// Structure GeoJSON invalide
    #[error("Invalid GeoJSON: {0}")]
    Invalid(String),
}

/// Identifiant de CRS non analysable
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid CRS identifier: {0}")]
pub struct CrsParseError(pub String);

/// Opérateur de comparaison inconnu
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown comparison operator: '{0}'")]
pub struct UnknownOperator(pub String);
