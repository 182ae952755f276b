use serde::{Deserialize, Serialize};

use crate::*;

/// Icon names available to decks, in the order they are handed out.
pub const ICON_NAMES: [&str; 30] = [
    "heart",
    "star",
    "diamond",
    "flame",
    "leaf",
    "musical-note",
    "football",
    "basketball",
    "car",
    "airplane",
    "boat",
    "bicycle",
    "pizza",
    "ice-cream",
    "cafe",
    "beer",
    "sunny",
    "moon",
    "cloud",
    "rainy",
    "snow",
    "thunderstorm",
    "rose",
    "bug",
    "fish",
    "paw",
    "trophy",
    "medal",
    "gift",
    "balloon",
];

/// Face shown for a card that is not revealed.
pub const HIDDEN_ICON: &str = "help-circle-outline";

const _: () = assert!(
    ICON_NAMES.len() >= MAX_GRID.pairs(),
    "icon catalogue cannot fill the largest grid"
);

/// Index of an icon inside an [`IconCatalogue`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IconId(pub u8);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IconCatalogue {
    names: &'static [&'static str],
}

impl IconCatalogue {
    pub const BUILTIN: Self = Self::new(&ICON_NAMES);

    pub const fn new(names: &'static [&'static str]) -> Self {
        Self { names }
    }

    pub const fn len(&self) -> usize {
        self.names.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, icon: IconId) -> &'static str {
        self.names
            .get(usize::from(icon.0))
            .copied()
            .unwrap_or(HIDDEN_ICON)
    }

    /// First `pairs` icons in catalogue order.
    pub fn select(&self, pairs: usize) -> Result<impl Iterator<Item = IconId> + use<>> {
        if pairs > self.len() || pairs > usize::from(u8::MAX) + 1 {
            return Err(GameError::CatalogueExhausted {
                required: pairs,
                available: self.len(),
            });
        }
        Ok((0..pairs).map(|index| IconId(index as u8)))
    }
}

impl Default for IconCatalogue {
    fn default() -> Self {
        Self::BUILTIN
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub icon: IconId,
    pub is_flipped: bool,
    pub is_matched: bool,
}

impl Card {
    pub const fn new(id: CardId, icon: IconId) -> Self {
        Self {
            id,
            icon,
            is_flipped: false,
            is_matched: false,
        }
    }

    pub const fn face(&self) -> CardFace {
        CardFace {
            is_flipped: self.is_flipped,
            is_matched: self.is_matched,
        }
    }

    pub fn set_face(&mut self, face: CardFace) {
        self.is_flipped = face.is_flipped;
        self.is_matched = face.is_matched;
    }

    /// Whether the icon is visible to the player.
    pub const fn is_face_up(&self) -> bool {
        self.is_flipped || self.is_matched
    }
}

/// The mutable part of a card, captured before a hint reveal and put back after.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFace {
    pub is_flipped: bool,
    pub is_matched: bool,
}
