//! Style actif visible par le moteur de rendu
//!
//! Un seul style est actif à la fois. Le remplacement est atomique: un
//! lecteur voit l'ancien ou le nouveau style, jamais un mélange.

use std::sync::{Arc, PoisonError, RwLock};

use qmlstyle::RenderLayer;
use serde::Serialize;
use tracing::debug;

/// Couches publiées pour une source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleDefinition {
    pub source_id: String,
    pub layers: Vec<RenderLayer>,
}

/// Emplacement du style actif
#[derive(Debug, Default)]
pub struct ActiveStyle {
    slot: RwLock<Option<Arc<StyleDefinition>>>,
}

impl ActiveStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publie `style` et retourne le style remplacé
    pub fn set_active(&self, style: impl Into<Arc<StyleDefinition>>) -> Option<Arc<StyleDefinition>> {
        let style = style.into();
        debug!(
            source = %style.source_id,
            layers = style.layers.len(),
            "Style actif remplacé"
        );
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.replace(style)
    }

    /// Retire le style actif
    pub fn clear(&self) -> Option<Arc<StyleDefinition>> {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        let previous = slot.take();
        if previous.is_some() {
            debug!("Style actif retiré");
        }
        previous
    }

    pub fn current(&self) -> Option<Arc<StyleDefinition>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_active(&self) -> bool {
        self.current().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(source: &str) -> StyleDefinition {
        StyleDefinition {
            source_id: source.to_string(),
            layers: Vec::new(),
        }
    }

    #[test]
    fn test_lifecycle() {
        let active = ActiveStyle::new();
        assert!(!active.is_active());

        assert!(active.set_active(style("a")).is_none());
        let previous = active.set_active(style("b")).unwrap();
        assert_eq!(previous.source_id, "a");
        assert_eq!(active.current().unwrap().source_id, "b");

        assert_eq!(active.clear().unwrap().source_id, "b");
        assert!(active.current().is_none());
        assert!(active.clear().is_none());
    }

    #[test]
    fn test_shared_between_threads() {
        let active = Arc::new(ActiveStyle::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let active = Arc::clone(&active);
                std::thread::spawn(move || {
                    active.set_active(style(&format!("s{}", i)));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(active.current().unwrap().source_id.starts_with('s'));
    }
}
