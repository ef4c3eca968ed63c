//! Card catalog: which cards exist per deck kind and where their images live.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::key::{ResourceCategory, ResourceKey};

/// Shared paper normal map every card material uses.
pub const PAPER_NORMAL: &str = "paper";

/// Deck families with their own back and edge artwork.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CardKind {
    Tarot,
    Playing,
}

impl CardKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tarot => "tarot",
            Self::Playing => "playing",
        }
    }
}

/// Image resolution tier. Low is meant for weak GPUs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AssetQuality {
    Low,
    #[default]
    High,
}

impl AssetQuality {
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "low" | "performance" => Some(Self::Low),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardDefinition {
    pub name: String,
    /// Path relative to the quality directory.
    pub path: String,
    /// Copies of this card in a freshly made deck.
    pub default_count: u32,
}

const TAROT_CARDS: [&str; 78] = [
    "0_the_fool",
    "1_the_magician",
    "2_the_high_priestess",
    "3_the_empress",
    "4_the_emperor",
    "5_the_hierophant",
    "6_the_lovers",
    "7_the_chariot",
    "8_strength",
    "9_the_hermit",
    "10_whell_of_fortune",
    "11_justice",
    "12_the_hanged_man",
    "13_death",
    "14_temperance",
    "15_the_devil",
    "16_the_tower",
    "17_the_star",
    "18_the_moon",
    "19_the_sun",
    "20_judgement",
    "21_the_world",
    "ace_of_cups",
    "two_of_cups",
    "three_of_cups",
    "four_of_cups",
    "five_of_cups",
    "six_of_cups",
    "seven_of_cups",
    "eight_of_cups",
    "nine_of_cups",
    "ten_of_cups",
    "page_of_cups",
    "knight_of_cups",
    "queen_of_cups",
    "king_of_cups",
    "ace_of_pentacles",
    "two_of_pentacles",
    "three_of_pentacles",
    "four_of_pentacles",
    "five_of_pentacles",
    "six_of_pentacles",
    "seven_of_pentacles",
    "eight_of_pentacles",
    "nine_of_pentacles",
    "ten_of_pentacles",
    "page_of_pentacles",
    "knight_of_pentacles",
    "queen_of_pentacles",
    "king_of_pentacles",
    "ace_of_swords",
    "two_of_swords",
    "three_of_swords",
    "four_of_swords",
    "five_of_swords",
    "six_of_swords",
    "seven_of_swords",
    "eight_of_swords",
    "nine_of_swords",
    "ten_of_swords",
    "page_of_swords",
    "knight_of_swords",
    "queen_of_swords",
    "king_of_swords",
    "ace_of_wands",
    "two_of_wands",
    "three_of_wands",
    "four_of_wands",
    "five_of_wands",
    "six_of_wands",
    "seven_of_wands",
    "eight_of_wands",
    "nine_of_wands",
    "ten_of_wands",
    "page_of_wands",
    "knight_of_wands",
    "queen_of_wands",
    "king_of_wands",
];

const PLAYING_RANKS: [&str; 13] = [
    "ace", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "jack",
    "queen", "king",
];
const PLAYING_SUITS: [&str; 4] = ["clubs", "diamonds", "hearts", "spades"];

/// Maps resource keys to asset paths. Paths are opaque strings to the cache;
/// only the loader interprets them.
#[derive(Clone, Debug)]
pub struct AssetCatalog {
    root: PathBuf,
    quality: AssetQuality,
    cards: HashMap<CardKind, Vec<CardDefinition>>,
    faces: HashMap<String, (CardKind, usize)>,
    extra: HashMap<ResourceKey, String>,
}

impl AssetCatalog {
    /// Empty catalog rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, quality: AssetQuality) -> Self {
        Self {
            root: root.into(),
            quality,
            cards: HashMap::new(),
            faces: HashMap::new(),
            extra: HashMap::new(),
        }
    }

    /// Tarot and playing decks plus the shared normal maps.
    pub fn standard(root: impl Into<PathBuf>, quality: AssetQuality) -> Self {
        let mut catalog = Self::new(root, quality);
        for name in TAROT_CARDS {
            catalog.register_card(CardKind::Tarot, name, format!("tarot/{name}.jpg"), 1);
        }
        for suit in PLAYING_SUITS {
            for rank in PLAYING_RANKS {
                let name = format!("{rank}_of_{suit}");
                let path = format!("playing/{name}.jpg");
                catalog.register_card(CardKind::Playing, name, path, 1);
            }
        }
        catalog.register(ResourceKey::normal_map(PAPER_NORMAL), "paper/paper_normal.jpg");
        catalog.register(ResourceKey::normal_map("felt"), "felt/felt_normal.jpg");
        catalog
    }

    /// Add a card to the end of `kind`'s list. Returns its face index.
    pub fn register_card(
        &mut self,
        kind: CardKind,
        name: impl Into<String>,
        path: impl Into<String>,
        default_count: u32,
    ) -> usize {
        let name = name.into();
        let list = self.cards.entry(kind).or_default();
        let index = list.len();
        self.faces.insert(name.clone(), (kind, index));
        list.push(CardDefinition {
            name,
            path: path.into(),
            default_count,
        });
        index
    }

    /// Register (or override) the path of an arbitrary key.
    pub fn register(&mut self, key: ResourceKey, path: impl Into<String>) {
        self.extra.insert(key, path.into());
    }

    pub fn quality(&self) -> AssetQuality {
        self.quality
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cards(&self, kind: CardKind) -> &[CardDefinition] {
        self.cards.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn face_name(&self, kind: CardKind, index: usize) -> Option<&str> {
        self.cards(kind).get(index).map(|def| def.name.as_str())
    }

    pub fn face_index(&self, name: &str) -> Option<(CardKind, usize)> {
        self.faces.get(name).copied()
    }

    /// Resolve a key to a loadable path, `None` when the catalog does not
    /// know the resource.
    pub fn path_for(&self, key: &ResourceKey) -> Option<String> {
        if let Some(path) = self.extra.get(key) {
            return Some(self.resolve(path));
        }
        let relative = match key.category {
            ResourceCategory::CardFace => {
                let (kind, index) = self.face_index(&key.name)?;
                self.cards(kind).get(index)?.path.clone()
            }
            ResourceCategory::CardBack => {
                let kind = self.kind_named(&key.name)?;
                format!("{}/back.jpg", kind.as_str())
            }
            ResourceCategory::CardEdge => {
                let kind = self.kind_named(&key.name)?;
                format!("{}/edge.jpg", kind.as_str())
            }
            ResourceCategory::NormalMap => return None,
        };
        Some(self.resolve(&relative))
    }

    fn kind_named(&self, name: &str) -> Option<CardKind> {
        self.cards
            .keys()
            .copied()
            .find(|kind| kind.as_str() == name)
    }

    fn resolve(&self, relative: &str) -> String {
        self.root
            .join(self.quality.dir_name())
            .join(relative)
            .to_string_lossy()
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_full_decks() {
        let catalog = AssetCatalog::standard("public", AssetQuality::High);
        assert_eq!(catalog.cards(CardKind::Tarot).len(), 78);
        assert_eq!(catalog.cards(CardKind::Playing).len(), 52);
        assert_eq!(catalog.face_name(CardKind::Tarot, 0), Some("0_the_fool"));
    }

    #[test]
    fn paths_follow_quality_tier() {
        let low = AssetCatalog::standard("public", AssetQuality::Low);
        let path = low.path_for(&ResourceKey::face("13_death")).expect("death path");
        assert!(path.ends_with("tarot/13_death.jpg"));
        assert!(path.contains("low"));

        let back = low.path_for(&ResourceKey::back(CardKind::Playing)).expect("back path");
        assert!(back.ends_with("playing/back.jpg"));

        let normal = low
            .path_for(&ResourceKey::normal_map(PAPER_NORMAL))
            .expect("normal path");
        assert!(normal.ends_with("paper/paper_normal.jpg"));
    }

    #[test]
    fn unknown_keys_have_no_path() {
        let catalog = AssetCatalog::standard("public", AssetQuality::High);
        assert!(catalog.path_for(&ResourceKey::face("the_joker")).is_none());
        assert!(catalog.path_for(&ResourceKey::normal_map("velvet")).is_none());
        assert_eq!(AssetQuality::parse("Performance"), Some(AssetQuality::Low));
    }
}
