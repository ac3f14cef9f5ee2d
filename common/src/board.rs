use crate::grid::{Cell, Dimensions};
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::BTreeSet;
use std::fmt;

/// Ground truth for a game: where the mines actually are.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Board {
    dimensions: Dimensions,
    mines: BTreeSet<Cell>,
}

impl Board {
    /// Places exactly `mines` mines uniformly at random on a `height` x `width` board.
    pub fn generate<R: Rng + ?Sized>(
        height: usize,
        width: usize,
        mines: usize,
        rng: &mut R,
    ) -> anyhow::Result<Self> {
        let dimensions = Dimensions::new(height, width);
        let total = dimensions
            .cell_count()
            .ok_or_else(|| anyhow::anyhow!("a {height}x{width} board has too many cells"))?;
        anyhow::ensure!(
            mines <= total,
            "a {height}x{width} board holds at most {total} mines, requested {mines}"
        );

        let cells: Vec<Cell> = dimensions.cells().collect();
        let mines = cells.choose_multiple(rng, mines).copied().collect();
        Ok(Board { dimensions, mines })
    }

    /// A board with a fixed mine layout.
    pub fn from_mines(
        dimensions: Dimensions,
        mines: impl IntoIterator<Item = Cell>,
    ) -> anyhow::Result<Self> {
        let mines: BTreeSet<Cell> = mines.into_iter().collect();
        if let Some(outside) = mines.iter().find(|&&cell| !dimensions.contains(cell)) {
            anyhow::bail!(
                "mine {outside} lies outside the {}x{} board",
                dimensions.height,
                dimensions.width
            );
        }
        Ok(Board { dimensions, mines })
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn mines(&self) -> &BTreeSet<Cell> {
        &self.mines
    }

    pub fn is_mine(&self, cell: Cell) -> bool {
        self.mines.contains(&cell)
    }

    /// Number of mines touching `cell`, not counting the cell itself.
    pub fn nearby_mines(&self, cell: Cell) -> usize {
        self.dimensions
            .neighbors(cell)
            .filter(|neighbor| self.is_mine(*neighbor))
            .count()
    }

    /// True once `found` is exactly the set of mines.
    pub fn won(&self, found: &BTreeSet<Cell>) -> bool {
        *found == self.mines
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = format!("{}-", "--".repeat(self.dimensions.width));
        for row in 0..self.dimensions.height {
            writeln!(f, "{rule}")?;
            for col in 0..self.dimensions.width {
                let mark = if self.is_mine(Cell::new(row, col)) { "X" } else { " " };
                write!(f, "|{mark}")?;
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_generate_places_exact_mine_count() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..10 {
            let board = Board::generate(8, 8, 8, &mut rng).unwrap();
            assert_eq!(board.mines().len(), 8);
            assert!(board.mines().iter().all(|&cell| board.dimensions().contains(cell)));
        }
    }

    #[test]
    fn test_generate_full_and_empty_boards() {
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(Board::generate(4, 3, 12, &mut rng).unwrap().mines().len(), 12);
        assert!(Board::generate(3, 3, 0, &mut rng).unwrap().mines().is_empty());
    }

    #[test]
    fn test_generate_overfull_board_fails() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(Board::generate(4, 3, 13, &mut rng).is_err());
        assert!(Board::generate(usize::MAX, 2, 0, &mut rng).is_err());
    }

    #[test]
    fn test_nearby_mines() {
        let board = Board::from_mines(
            Dimensions::new(3, 3),
            [Cell::new(0, 0), Cell::new(1, 0), Cell::new(1, 1)],
        )
        .unwrap();

        assert_eq!(board.nearby_mines(Cell::new(0, 1)), 3);
        assert_eq!(board.nearby_mines(Cell::new(1, 1)), 2);
        assert_eq!(board.nearby_mines(Cell::new(2, 2)), 1);
        assert_eq!(board.nearby_mines(Cell::new(0, 2)), 1);
    }

    #[test]
    fn test_from_mines_rejects_outside_cells() {
        assert!(Board::from_mines(Dimensions::new(2, 2), [Cell::new(2, 0)]).is_err());
    }

    #[test]
    fn test_won() {
        let board = Board::from_mines(Dimensions::new(1, 4), [Cell::new(0, 3)]).unwrap();
        assert!(board.won(&BTreeSet::from([Cell::new(0, 3)])));
        assert!(!board.won(&BTreeSet::new()));
        assert!(!board.won(&BTreeSet::from([Cell::new(0, 3), Cell::new(0, 2)])));
    }

    #[test]
    fn test_display() {
        let board = Board::from_mines(Dimensions::new(1, 2), [Cell::new(0, 1)]).unwrap();
        assert_eq!(board.to_string(), "-----\n| |X|\n-----\n");
    }
}
