use super::*;

/// Generation strategy that pairs the first icons of the catalogue and then
/// shuffles uniformly, with no constraint on where the two halves of a pair land.
#[derive(Clone, Debug)]
pub struct RandomDeckGenerator {
    rng: rand::rngs::SmallRng,
    catalogue: IconCatalogue,
}

impl RandomDeckGenerator {
    pub fn new(seed: u64) -> Self {
        Self::with_catalogue(seed, IconCatalogue::BUILTIN)
    }

    pub fn with_catalogue(seed: u64, catalogue: IconCatalogue) -> Self {
        use rand::SeedableRng;

        Self {
            rng: rand::rngs::SmallRng::seed_from_u64(seed),
            catalogue,
        }
    }
}

impl DeckGenerator for RandomDeckGenerator {
    fn generate(&mut self, level: Level) -> Result<Deck> {
        use rand::seq::SliceRandom;

        if level == 0 {
            return Err(GameError::InvalidLevel(level));
        }

        let grid = grid_size(level);
        let icons = self.catalogue.select(grid.pairs()).inspect_err(|err| {
            log::error!("Cannot build a deck for level {level}: {err}");
        })?;

        let mut cards = Vec::with_capacity(grid.total_cards());
        for (index, icon) in icons.enumerate() {
            let first = (index * 2) as CardId;
            cards.push(Card::new(first, icon));
            cards.push(Card::new(first + 1, icon));
        }

        cards.shuffle(&mut self.rng);
        log::debug!(
            "Generated level {level} deck, {}x{} with {} pairs",
            grid.rows,
            grid.cols,
            grid.pairs()
        );

        Deck::from_cards(grid, cards, self.catalogue)
    }
}
