use itertools::iproduct;
use std::fmt;

/// A (row, column) coordinate on the board, 0-indexed.
///
/// Ordering is row-major, which is the order every set of cells in this crate iterates in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The size of a rectangular board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    pub height: usize,
    pub width: usize,
}

impl Dimensions {
    pub const fn new(height: usize, width: usize) -> Self {
        Dimensions { height, width }
    }

    /// Number of cells, or `None` if it does not fit in a `usize`.
    pub fn cell_count(&self) -> Option<usize> {
        self.height.checked_mul(self.width)
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    /// Every cell on the board, in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        iproduct!(0..self.height, 0..self.width).map(Cell::from)
    }

    /// The up to 8 cells touching `cell`, clipped at the board edges.
    /// The cell itself is never included.
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + use<> {
        let Dimensions { height, width } = *self;

        iproduct!(-1isize..=1, -1isize..=1).filter_map(move |(dr, dc)| {
            if dr == 0 && dc == 0 {
                return None;
            }

            let row = cell.row as isize + dr;
            let col = cell.col as isize + dc;

            if row >= 0 && row < height as isize && col >= 0 && col < width as isize {
                Some(Cell::new(row as usize, col as usize))
            } else {
                None
            }
        })
    }
}
