//! # mapstyle
//!
//! Préparation de couches cartographiques pour un moteur de rendu
//! vectoriel à partir de styles QGIS et de documents GeoJSON.
//!
//! ## Features
//!
//! - Styles QGIS (.qml) convertis en couches (via `qmlstyle`)
//! - Détection du CRS d'un document et reprojection sans dépendance système
//! - Expressions `fill-color` à partir de règles booléennes, catégorielles et numériques
//! - Style actif partagé entre threads
//!
//! ## Usage CLI
//!
//! ```bash
//! # Style QGIS vers couches de rendu
//! mapstyle style --path ./landuse.qml --source landuse
//!
//! # Reprojection (CRS source détecté dans le document)
//! mapstyle reproject --path ./parcelles.geojson --to EPSG:4326
//!
//! # Propriétés paint à partir de règles utilisateur
//! mapstyle paint --rules ./rules.json --data ./parcelles.geojson
//! ```

pub mod active;
pub mod config;
pub mod crs;
pub mod document;
pub mod error;
pub mod paint;
pub mod pipeline;
pub mod reproject;
pub mod reproject_lite;

pub use active::{ActiveStyle, StyleDefinition};
pub use config::Config;
pub use crs::{detect, CrsId};
pub use error::{CrsParseError, DocumentError};
pub use paint::{LayerPaint, LayerStyle, PaintExpression};
pub use pipeline::{LoadedStyle, MapPipeline};
pub use reproject::{reproject, reproject_detected, reproject_to_default};
