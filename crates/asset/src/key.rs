//! Identity of a cacheable visual resource.

use std::fmt;

use crate::catalog::CardKind;

/// Kind of visual resource a key names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceCategory {
    CardFace,
    CardBack,
    CardEdge,
    NormalMap,
}

impl ResourceCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CardFace => "card_face",
            Self::CardBack => "card_back",
            Self::CardEdge => "card_edge",
            Self::NormalMap => "normal_map",
        }
    }
}

/// `(category, name)` pair, e.g. `(CardFace, "13_death")` or `(CardEdge, "tarot")`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub category: ResourceCategory,
    pub name: String,
}

impl ResourceKey {
    pub fn new(category: ResourceCategory, name: impl Into<String>) -> Self {
        Self {
            category,
            name: name.into(),
        }
    }

    pub fn face(name: impl Into<String>) -> Self {
        Self::new(ResourceCategory::CardFace, name)
    }

    pub fn back(kind: CardKind) -> Self {
        Self::new(ResourceCategory::CardBack, kind.as_str())
    }

    pub fn edge(kind: CardKind) -> Self {
        Self::new(ResourceCategory::CardEdge, kind.as_str())
    }

    pub fn normal_map(name: impl Into<String>) -> Self {
        Self::new(ResourceCategory::NormalMap, name)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category.as_str(), self.name)
    }
}
