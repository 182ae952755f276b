use serde::{Deserialize, Serialize};

/// One-based level number.
pub type Level = u32;

/// Stable identifier of a card within one deck.
pub type CardId = u16;

/// Board dimension type used for rows and columns.
pub type Dim = u8;

/// Largest number of columns any level uses.
pub const MAX_COLS: Dim = 6;

/// Largest number of rows any level uses.
pub const MAX_ROWS: Dim = 8;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub rows: Dim,
    pub cols: Dim,
}

impl GridSize {
    pub const fn new(rows: Dim, cols: Dim) -> Self {
        Self { rows, cols }
    }

    pub const fn total_cards(self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub const fn pairs(self) -> usize {
        self.total_cards() / 2
    }

    pub const fn to_nd_index(self) -> (usize, usize) {
        (self.rows as usize, self.cols as usize)
    }
}

/// Grid size for a level. Every band of five levels grows the board until it
/// reaches 8 rows by 6 columns.
pub const fn grid_size(level: Level) -> GridSize {
    let (rows, cols) = if level <= 5 {
        (2, 3)
    } else if level <= 10 {
        (3, 4)
    } else if level <= 15 {
        (4, 4)
    } else if level <= 20 {
        (4, 5)
    } else if level <= 25 {
        (4, 6)
    } else if level <= 30 {
        (5, 6)
    } else if level <= 35 {
        (6, 6)
    } else if level <= 40 {
        (7, 6)
    } else {
        (MAX_ROWS, MAX_COLS)
    };
    GridSize::new(rows, cols)
}

/// The largest grid any level can produce.
pub const MAX_GRID: GridSize = grid_size(Level::MAX);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_of_five_levels_share_a_grid() {
        assert_eq!(grid_size(1), GridSize::new(2, 3));
        assert_eq!(grid_size(5), GridSize::new(2, 3));
        assert_eq!(grid_size(6), GridSize::new(3, 4));
        assert_eq!(grid_size(30), GridSize::new(5, 6));
        assert_eq!(grid_size(31), GridSize::new(6, 6));
        assert_eq!(grid_size(40), GridSize::new(7, 6));
        assert_eq!(grid_size(41), GridSize::new(8, 6));
        assert_eq!(grid_size(200), GridSize::new(8, 6));
    }

    #[test]
    fn every_grid_has_an_even_card_count_within_bounds() {
        for level in 1..=200 {
            let grid = grid_size(level);
            assert_eq!(grid.total_cards() % 2, 0, "level {level}");
            assert!(grid.cols <= MAX_COLS);
            assert!(grid.rows <= MAX_ROWS);
        }
        assert_eq!(MAX_GRID.total_cards(), 48);
    }
}
