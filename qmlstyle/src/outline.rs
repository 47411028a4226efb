//! Correction des contours depuis le texte brut du QML
//!
//! La conversion structurée perd ou calcule mal les attributs de contour.
//! Ce module relit les blocs `<symbol>…</symbol>` directement dans le texte et
//! produit une liste creuse, alignée sur la position des symboles.

use std::sync::OnceLock;

use memchr::memmem;
use regex::Regex;
use tracing::trace;

use crate::normalize;

/// Contour récupéré pour un symbole
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineCorrection {
    /// Couleur `rgba(r,g,b,a)`, alpha ramené à `[0, 1]`
    pub color: String,
    /// Épaisseur lue dans le QML
    pub width: f64,
}

/// Emplacement d'un bloc `<symbol>`: nom et correction éventuelle
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineSlot {
    pub symbol: Option<String>,
    pub correction: Option<OutlineCorrection>,
}

/// Corrections indexées par position de symbole, sans compaction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outlines(Vec<OutlineSlot>);

impl Outlines {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn slots(&self) -> &[OutlineSlot] {
        &self.0
    }

    /// Correction à la position `index`
    pub fn at(&self, index: usize) -> Option<&OutlineCorrection> {
        self.0.get(index).and_then(|slot| slot.correction.as_ref())
    }

    /// Correction d'une règle: par nom de symbole si connu, sinon par position
    pub fn get(&self, index: usize, symbol: Option<&str>) -> Option<&OutlineCorrection> {
        if let Some(name) = symbol {
            if let Some(slot) = self.0.iter().find(|s| s.symbol.as_deref() == Some(name)) {
                return slot.correction.as_ref();
            }
        }
        self.at(index)
    }
}

fn symbol_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // `\b` exclut `<symbols>`
    RE.get_or_init(|| Regex::new(r"(?s)<symbol\b([^>]*)>.*?</symbol>").expect("valid symbol regex"))
}

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\bname="([^"]*)""#).expect("valid name regex"))
}

fn property_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // <prop k=".." v=".."/> ou <Option name=".." value=".."/>, attributs dans n'importe quel ordre
    RE.get_or_init(|| Regex::new(r"<(?:prop|Option)\s[^>]*>").expect("valid property regex"))
}

fn attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Séparateur quelconque (espace, tabulation, retour ligne), guillemets simples ou doubles
    RE.get_or_init(|| {
        Regex::new(r#"\s([\w:.-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid attribute regex")
    })
}

fn tag_attribute<'a>(tag: &'a str, attribute: &str) -> Option<&'a str> {
    attribute_regex()
        .captures_iter(tag)
        .find(|caps| &caps[1] == attribute)
        .and_then(|caps| caps.get(2).or_else(|| caps.get(3)))
        .map(|m| m.as_str())
}

/// Extrait les contours de chaque bloc `<symbol>` du document brut.
///
/// Un bloc sans `outline_color` ou sans `outline_width` produit un
/// emplacement vide: les positions suivantes ne sont jamais décalées.
pub fn extract_outlines(qml: &str) -> Outlines {
    if memmem::find(qml.as_bytes(), b"<symbol").is_none() {
        return Outlines::default();
    }

    let slots = symbol_block_regex()
        .captures_iter(qml)
        .enumerate()
        .map(|(index, caps)| {
            let header = caps.get(1).map_or("", |m| m.as_str());
            let block = caps.get(0).map_or("", |m| m.as_str());

            let symbol = name_regex()
                .captures(header)
                .map(|c| c[1].to_string());
            let correction = read_correction(block);

            if correction.is_none() {
                trace!(index, symbol = ?symbol, "Symbole sans contour complet");
            }

            OutlineSlot { symbol, correction }
        })
        .collect();

    Outlines(slots)
}

fn read_correction(block: &str) -> Option<OutlineCorrection> {
    let mut raw_color = None;
    let mut raw_width = None;

    for tag in property_tag_regex().find_iter(block).map(|m| m.as_str()) {
        let key = tag_attribute(tag, "k").or_else(|| tag_attribute(tag, "name"));
        let value = tag_attribute(tag, "v").or_else(|| tag_attribute(tag, "value"));
        match (key, value) {
            (Some("outline_color"), Some(v)) if raw_color.is_none() => raw_color = Some(v),
            (Some("outline_width"), Some(v)) if raw_width.is_none() => raw_width = Some(v),
            _ => {}
        }
    }

    let width = fast_float::parse::<f64, _>(raw_width?.trim())
        .ok()
        .filter(|w| w.is_finite())?;

    Some(OutlineCorrection {
        color: to_rgba(raw_color?),
        width,
    })
}

/// Couleur `rgba(...)`; une couleur CSS est conservée telle quelle
fn to_rgba(raw: &str) -> String {
    normalize::to_rgba(raw).unwrap_or_else(|| raw.trim().to_string())
}
