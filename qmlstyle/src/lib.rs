//! # qmlstyle
//!
//! Conversion des styles QGIS (`.qml`) en couches pour un moteur de rendu
//! de type Mapbox/MapLibre.
//!
//! ## Features
//!
//! - Parsing XML avec `roxmltree` (formats `<prop>` et `<Option>` de QGIS)
//! - Renderers symbole unique, catégorisé, gradué et par règles
//! - Conversion isolée par règle: une règle invalide n'invalide pas le style
//! - Correction des contours par relecture du texte brut
//! - Séparation des couleurs `r,g,b,a` en couleur + opacité
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qmlstyle::{build_layers, load, DEFAULT_MAX_BYTES};
//! use std::path::Path;
//!
//! let result = load(Path::new("parcelles.qml"), DEFAULT_MAX_BYTES)?;
//! for warning in &result.warnings {
//!     println!("{}", warning);
//! }
//! let layers = build_layers(&result.style, &result.outlines, "parcelles");
//! ```

pub mod error;
pub mod normalize;
pub mod outline;
pub mod parser;
pub mod render;
pub mod types;
pub mod validate;

pub use error::{ConversionError, StyleError, StyleWarning};
pub use normalize::normalize;
pub use outline::{extract_outlines, OutlineCorrection, Outlines};
pub use render::{build_layers, RenderLayer};
pub use types::{Category, GeoStyle, ParseResult, QmlStyle, StyleLayer};
pub use validate::is_well_formed;

use std::path::Path;

use memchr::memmem;
use tracing::{debug, warn};

/// Taille maximale d'un fichier de style (5 Mo)
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Parse un document QML déjà décodé.
///
/// Le document est d'abord validé comme XML bien formé: un document
/// malformé est rejeté (`StyleError::MalformedXml`) sans atteindre le parseur.
pub fn parse(content: &str) -> Result<ParseResult, StyleError> {
    validate::ensure_well_formed(content)?;

    let (style, warnings) = parser::parse(content)?;
    let outlines = outline::extract_outlines(content);

    for warning in &warnings {
        debug!(%warning, "Style warning");
    }

    Ok(ParseResult {
        style,
        outlines,
        warnings,
    })
}

/// Parse un document QML brut (décodage selon le prologue XML)
pub fn parse_bytes(data: &[u8]) -> Result<ParseResult, StyleError> {
    let decoded = decode(data);
    parse(&decoded)
}

/// Charge un fichier `.qml` depuis le disque
///
/// # Errors
///
/// `UnsupportedFile` si l'extension n'est pas `.qml`, `TooLarge` au-delà de
/// `max_bytes`, puis les erreurs de [`parse`].
pub fn load(path: &Path, max_bytes: u64) -> Result<ParseResult, StyleError> {
    let is_qml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("qml"));
    if !is_qml {
        return Err(StyleError::UnsupportedFile(path.display().to_string()));
    }

    let size = std::fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(StyleError::TooLarge {
            size,
            max: max_bytes,
        });
    }

    let data = std::fs::read(path)?;
    debug!(path = %path.display(), size, "Lecture du fichier QML");
    parse_bytes(&data)
}

/// Décode les bytes avec l'encodage déclaré dans le prologue XML
pub fn decode(data: &[u8]) -> String {
    let encoding = declared_encoding(data).unwrap_or(encoding_rs::UTF_8);

    if encoding == encoding_rs::UTF_8 {
        // Chemin rapide: UTF-8 valide sans BOM
        let body = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
        if let Ok(text) = simdutf8::basic::from_utf8(body) {
            return text.to_string();
        }
    }

    let (decoded, used, had_errors) = encoding.decode(data);
    if had_errors {
        warn!(encoding = used.name(), "Caractères invalides remplacés au décodage");
    }
    decoded.into_owned()
}

/// Lit `encoding="..."` dans la déclaration `<?xml ...?>`
fn declared_encoding(data: &[u8]) -> Option<&'static encoding_rs::Encoding> {
    let head = &data[..data.len().min(256)];
    let end = memmem::find(head, b"?>")?;
    let prolog = &head[..end];

    let pos = memmem::find(prolog, b"encoding=")?;
    let rest = &prolog[pos + 9..];
    let quote = *rest.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let value = &rest[1..];
    let close = value.iter().position(|&b| b == quote)?;

    encoding_rs::Encoding::for_label(&value[..close])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        let data = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><qgis name=\"é\"/>".as_bytes();
        assert!(decode(data).contains('é'));
    }

    #[test]
    fn test_decode_latin1() {
        let mut data = b"<?xml version='1.0' encoding='ISO-8859-1'?><qgis name=\"".to_vec();
        data.push(0xE9); // é en Latin-1
        data.extend_from_slice(b"\"/>");
        assert!(decode(&data).contains('é'));
    }

    #[test]
    fn test_declared_encoding_absent() {
        assert!(declared_encoding(b"<qgis/>").is_none());
    }

    #[test]
    fn test_malformed_rejected_before_parsing() {
        // Un document malformé ne devient jamais InvalidDocument (erreur du parseur)
        let result = parse("<qgis><renderer-v2 type=\"singleSymbol\"></qgis>");
        assert!(matches!(result, Err(StyleError::MalformedXml(_))));
    }

    #[test]
    fn test_load_rejects_extension() {
        let result = load(Path::new("style.sld"), DEFAULT_MAX_BYTES);
        assert!(matches!(result, Err(StyleError::UnsupportedFile(_))));
    }

    #[test]
    fn test_load_too_large() {
        let path = std::env::temp_dir().join("qmlstyle_too_large.qml");
        std::fs::write(&path, "<qgis/>").unwrap();

        let result = load(&path, 3);
        assert!(matches!(result, Err(StyleError::TooLarge { size: 7, max: 3 })));

        std::fs::remove_file(path).ok();
    }
}
