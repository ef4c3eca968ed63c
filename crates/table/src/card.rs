//! Card identity as stored in a stack.

use asset::{AssetCatalog, CardKind, ResourceKey};

/// One physical card. Immutable; the stack order is the only mutable part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CardInstance {
    pub kind: CardKind,
    /// Index into the catalog's card list for `kind`.
    pub face_index: usize,
    pub face_down: bool,
}

impl CardInstance {
    pub fn new(kind: CardKind, face_index: usize) -> Self {
        Self {
            kind,
            face_index,
            face_down: false,
        }
    }

    pub fn tarot(face_index: usize) -> Self {
        Self::new(CardKind::Tarot, face_index)
    }

    #[must_use]
    pub fn with_face_down(mut self, face_down: bool) -> Self {
        self.face_down = face_down;
        self
    }

    /// Catalog name of the face artwork. Unknown indices get a synthetic name
    /// that the catalog cannot resolve, so loading it fails instead of
    /// silently showing another card.
    pub fn face_name(&self, catalog: &AssetCatalog) -> String {
        match catalog.face_name(self.kind, self.face_index) {
            Some(name) => name.to_string(),
            None => format!("{}#{}", self.kind.as_str(), self.face_index),
        }
    }

    pub fn face_key(&self, catalog: &AssetCatalog) -> ResourceKey {
        ResourceKey::face(self.face_name(catalog))
    }
}

/// Fresh, unshuffled deck: every catalog card of `kind` times its default count.
pub fn standard_deck(catalog: &AssetCatalog, kind: CardKind) -> Vec<CardInstance> {
    catalog
        .cards(kind)
        .iter()
        .enumerate()
        .flat_map(|(index, def)| {
            std::iter::repeat_n(CardInstance::new(kind, index), def.default_count as usize)
        })
        .collect()
}
