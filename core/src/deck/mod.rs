use ndarray::ArrayView2;
use std::collections::{BTreeMap, BTreeSet};

use crate::*;
pub use random::*;

mod random;

pub trait DeckGenerator {
    fn generate(&mut self, level: Level) -> Result<Deck>;
}

/// Cards of one round laid out row by row over the level's grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Deck {
    grid: GridSize,
    cards: Vec<Card>,
    catalogue: IconCatalogue,
}

impl Deck {
    /// Builds a deck from already placed cards, checking the pairing invariants.
    pub fn from_cards(grid: GridSize, cards: Vec<Card>, catalogue: IconCatalogue) -> Result<Self> {
        if cards.len() != grid.total_cards() {
            return Err(GameError::InvalidDeck("card count does not fill the grid"));
        }

        let mut icon_counts: BTreeMap<IconId, usize> = BTreeMap::new();
        let mut ids = BTreeSet::new();
        for card in &cards {
            *icon_counts.entry(card.icon).or_default() += 1;
            if !ids.insert(card.id) {
                return Err(GameError::InvalidDeck("duplicate card id"));
            }
            if card.is_matched && !card.is_flipped {
                return Err(GameError::InvalidDeck("matched card is face down"));
            }
        }
        if icon_counts.values().any(|&count| count != 2) {
            return Err(GameError::InvalidDeck("icon does not appear exactly twice"));
        }
        if icon_counts.len() != grid.pairs() {
            return Err(GameError::InvalidDeck("wrong number of distinct icons"));
        }

        Ok(Self {
            grid,
            cards,
            catalogue,
        })
    }

    pub fn grid(&self) -> GridSize {
        self.grid
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn total_pairs(&self) -> usize {
        self.grid.pairs()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn catalogue(&self) -> IconCatalogue {
        self.catalogue
    }

    pub fn icon_name(&self, card: &Card) -> &'static str {
        self.catalogue.name(card.icon)
    }

    pub fn position_of(&self, id: CardId) -> Option<usize> {
        self.cards.iter().position(|card| card.id == id)
    }

    pub fn matched_count(&self) -> usize {
        self.cards.iter().filter(|card| card.is_matched).count()
    }

    /// Row-major view of the cards, shaped like the board.
    pub fn as_grid(&self) -> ArrayView2<'_, Card> {
        ArrayView2::from_shape(self.grid.to_nd_index(), &self.cards)
            .expect("deck length always matches its grid")
    }

    pub(crate) fn cards_mut(&mut self) -> &mut [Card] {
        &mut self.cards
    }
}
