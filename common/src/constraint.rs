use crate::error::KnowledgeError;
use crate::grid::Cell;
use itertools::Itertools;
use std::collections::BTreeSet;
use std::fmt;

/// A logical statement about the board: exactly `count` of `cells` are mines.
///
/// `count <= cells.len()` holds after every operation. Any step that would break it
/// fails with [`KnowledgeError::InternalConsistency`] instead of clamping.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Constraint {
    cells: BTreeSet<Cell>,
    count: usize,
}

impl Constraint {
    pub fn new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Result<Self, KnowledgeError> {
        let cells: BTreeSet<Cell> = cells.into_iter().collect();
        if count > cells.len() {
            return Err(KnowledgeError::inconsistent(format!(
                "{count} mines cannot fit in {} cells",
                cells.len()
            )));
        }
        Ok(Constraint { cells, count })
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Every cell, if every remaining cell must be a mine.
    pub fn deduce_mines(&self) -> BTreeSet<Cell> {
        if self.cells.len() == self.count {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Every cell, if no mines remain among them.
    pub fn deduce_safe(&self) -> BTreeSet<Cell> {
        if self.count == 0 {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Removes a confirmed mine, accounting for it in the count.
    /// Returns whether the constraint changed.
    pub fn resolve_mine(&mut self, cell: Cell) -> Result<bool, KnowledgeError> {
        if !self.cells.contains(&cell) {
            return Ok(false);
        }
        if self.count == 0 {
            return Err(KnowledgeError::inconsistent(format!(
                "{cell} is a mine but {self} has no mines left"
            )));
        }
        self.cells.remove(&cell);
        self.count -= 1;
        Ok(true)
    }

    /// Removes a confirmed safe cell; the count is unchanged.
    /// Returns whether the constraint changed.
    pub fn resolve_safe(&mut self, cell: Cell) -> Result<bool, KnowledgeError> {
        if !self.cells.contains(&cell) {
            return Ok(false);
        }
        if self.count == self.cells.len() {
            return Err(KnowledgeError::inconsistent(format!(
                "{cell} is safe but every cell of {self} is a mine"
            )));
        }
        self.cells.remove(&cell);
        Ok(true)
    }

    /// Subset resolution: if `subset.cells ⊆ self.cells`, the mines outside the subset
    /// are the difference of the two counts.
    ///
    /// Returns `None` when `subset` is not a subset, or when the cell sets are equal
    /// (nothing new to learn).
    pub fn subtract(&self, subset: &Constraint) -> Result<Option<Constraint>, KnowledgeError> {
        if !subset.cells.is_subset(&self.cells) {
            return Ok(None);
        }
        if subset.cells.len() == self.cells.len() {
            if subset.count != self.count {
                return Err(KnowledgeError::inconsistent(format!(
                    "{subset} and {self} cover the same cells with different counts"
                )));
            }
            return Ok(None);
        }

        let count = self.count.checked_sub(subset.count).ok_or_else(|| {
            KnowledgeError::inconsistent(format!("{subset} holds more mines than its superset {self}"))
        })?;
        Constraint::new(self.cells.difference(&subset.cells).copied(), count).map(Some)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}} = {}", self.cells.iter().join(", "), self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(coords: &[(usize, usize)]) -> Vec<Cell> {
        coords.iter().copied().map(Cell::from).collect()
    }

    #[test]
    fn test_deduce_mines_when_count_equals_size() {
        let constraint = Constraint::new(cells(&[(0, 0), (0, 1)]), 2).unwrap();
        assert_eq!(constraint.deduce_mines().len(), 2);
        assert!(constraint.deduce_safe().is_empty());
    }

    #[test]
    fn test_deduce_safe_when_count_is_zero() {
        let constraint = Constraint::new(cells(&[(0, 0), (0, 1)]), 0).unwrap();
        assert_eq!(constraint.deduce_safe().len(), 2);
        assert!(constraint.deduce_mines().is_empty());
    }

    #[test]
    fn test_undetermined_constraint_deduces_nothing() {
        let constraint = Constraint::new(cells(&[(0, 0), (0, 1), (1, 1)]), 1).unwrap();
        assert!(constraint.deduce_mines().is_empty());
        assert!(constraint.deduce_safe().is_empty());
    }

    #[test]
    fn test_resolve_mine_decrements_count() {
        let mut constraint = Constraint::new(cells(&[(0, 0), (0, 1), (1, 1)]), 2).unwrap();

        assert!(constraint.resolve_mine(Cell::new(0, 0)).unwrap());
        assert_eq!(constraint.count(), 1);
        assert_eq!(constraint.cells().len(), 2);

        // Absent cells are a no-op.
        assert!(!constraint.resolve_mine(Cell::new(5, 5)).unwrap());
        assert_eq!(constraint.count(), 1);
    }

    #[test]
    fn test_resolve_safe_keeps_count() {
        let mut constraint = Constraint::new(cells(&[(0, 0), (0, 1), (1, 1)]), 1).unwrap();

        assert!(constraint.resolve_safe(Cell::new(1, 1)).unwrap());
        assert_eq!(constraint.count(), 1);
        assert!(!constraint.contains(Cell::new(1, 1)));
        assert!(!constraint.resolve_safe(Cell::new(1, 1)).unwrap());
    }

    #[test]
    fn test_count_never_goes_negative() {
        let mut constraint = Constraint::new(cells(&[(0, 0), (0, 1)]), 0).unwrap();
        let err = constraint.resolve_mine(Cell::new(0, 0)).unwrap_err();
        assert!(matches!(err, KnowledgeError::InternalConsistency(_)));
        assert_eq!(constraint.count(), 0);
        assert!(constraint.contains(Cell::new(0, 0)));
    }

    #[test]
    fn test_count_never_exceeds_cells() {
        assert!(Constraint::new(cells(&[(0, 0)]), 2).is_err());

        let mut constraint = Constraint::new(cells(&[(0, 0), (0, 1)]), 2).unwrap();
        assert!(constraint.resolve_safe(Cell::new(0, 0)).is_err());
    }

    #[test]
    fn test_subtract_subset() {
        let small = Constraint::new(cells(&[(0, 0), (0, 1)]), 1).unwrap();
        let big = Constraint::new(cells(&[(0, 0), (0, 1), (0, 2)]), 2).unwrap();

        let derived = big.subtract(&small).unwrap().unwrap();
        assert_eq!(derived, Constraint::new(cells(&[(0, 2)]), 1).unwrap());

        // Not a subset the other way around.
        assert_eq!(small.subtract(&big).unwrap(), None);
    }

    #[test]
    fn test_subtract_equal_sets() {
        let a = Constraint::new(cells(&[(0, 0), (0, 1)]), 1).unwrap();
        assert_eq!(a.subtract(&a.clone()).unwrap(), None);

        let b = Constraint::new(cells(&[(0, 0), (0, 1)]), 2).unwrap();
        assert!(a.subtract(&b).is_err());
    }

    #[test]
    fn test_subtract_rejects_negative_count() {
        let small = Constraint::new(cells(&[(0, 0)]), 1).unwrap();
        let big = Constraint::new(cells(&[(0, 0), (0, 1)]), 0).unwrap();
        assert!(matches!(
            big.subtract(&small),
            Err(KnowledgeError::InternalConsistency(_))
        ));
    }

    #[test]
    fn test_display() {
        let constraint = Constraint::new(cells(&[(0, 1), (0, 0)]), 1).unwrap();
        assert_eq!(constraint.to_string(), "{(0, 0), (0, 1)} = 1");
    }
}
