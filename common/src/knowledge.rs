use crate::constraint::Constraint;
use crate::error::{InvalidMove, KnowledgeError};
use crate::grid::{Cell, Dimensions};
use itertools::Itertools;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::BTreeSet;

/// Everything the player has learned about a board.
///
/// Holds the cells already probed, the cells known to be mines or safe, and the live
/// constraints over the cells whose status is still open. Every mutating operation
/// runs propagation to a fixed point before returning, so callers only ever see a
/// quiescent state.
///
/// Invariants:
/// - `known_mines` and `known_safe` are disjoint.
/// - No live constraint mentions a cell in `known_mines` or `known_safe`.
/// - `moves_made`, `known_mines` and `known_safe` only ever grow.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct KnowledgeBase {
    dimensions: Dimensions,
    moves_made: BTreeSet<Cell>,
    known_mines: BTreeSet<Cell>,
    known_safe: BTreeSet<Cell>,
    constraints: Vec<Constraint>,
}

impl KnowledgeBase {
    pub fn new(dimensions: Dimensions) -> Self {
        KnowledgeBase {
            dimensions,
            moves_made: BTreeSet::new(),
            known_mines: BTreeSet::new(),
            known_safe: BTreeSet::new(),
            constraints: Vec::new(),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    pub fn moves_made(&self) -> &BTreeSet<Cell> {
        &self.moves_made
    }

    pub fn known_mines(&self) -> &BTreeSet<Cell> {
        &self.known_mines
    }

    pub fn known_safe(&self) -> &BTreeSet<Cell> {
        &self.known_safe
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Records that `cell` was probed, was safe, and has `mine_count` mines around it,
    /// then propagates the new information.
    ///
    /// The count is checked against what is already known about the neighbours: it must
    /// be at least the number of known adjacent mines and at most that plus the number of
    /// unresolved neighbours. On any error, including a contradiction found during
    /// propagation, the knowledge base is left as it was before the call.
    pub fn record_observation(&mut self, cell: Cell, mine_count: usize) -> Result<(), KnowledgeError> {
        self.check_bounds(cell)?;
        if self.moves_made.contains(&cell) {
            return Err(invalid_move(cell, InvalidMove::AlreadyMoved));
        }
        if self.known_mines.contains(&cell) {
            return Err(invalid_move(cell, InvalidMove::KnownMine));
        }

        let mut adjacent_mines = 0;
        let mut unresolved = BTreeSet::new();
        for neighbor in self.dimensions.neighbors(cell) {
            if self.known_mines.contains(&neighbor) {
                adjacent_mines += 1;
            } else if !self.known_safe.contains(&neighbor) {
                unresolved.insert(neighbor);
            }
        }

        let max = adjacent_mines + unresolved.len();
        if mine_count < adjacent_mines || mine_count > max {
            return Err(invalid_move(
                cell,
                InvalidMove::MineCountOutOfRange {
                    count: mine_count,
                    min: adjacent_mines,
                    max,
                },
            ));
        }

        let mut next = self.clone();
        next.moves_made.insert(cell);
        next.mark_safe(cell)?;

        // Known mines are already accounted for, so only the remainder is spread over
        // the unresolved neighbours.
        if !unresolved.is_empty() {
            next.add_constraint(Constraint::new(unresolved, mine_count - adjacent_mines)?)?;
        }

        next.propagate_to_fixed_point()?;
        *self = next;
        Ok(())
    }

    /// Records `cell` as a mine and removes it from every live constraint.
    /// Returns whether this was new information.
    pub fn mark_mine(&mut self, cell: Cell) -> Result<bool, KnowledgeError> {
        self.check_bounds(cell)?;
        if self.known_safe.contains(&cell) {
            return Err(KnowledgeError::inconsistent(format!(
                "{cell} is known safe and cannot become a mine"
            )));
        }
        if !self.known_mines.insert(cell) {
            return Ok(false);
        }
        for constraint in &mut self.constraints {
            constraint.resolve_mine(cell)?;
        }
        Ok(true)
    }

    /// Records `cell` as safe and removes it from every live constraint.
    /// Returns whether this was new information.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<bool, KnowledgeError> {
        self.check_bounds(cell)?;
        if self.known_mines.contains(&cell) {
            return Err(KnowledgeError::inconsistent(format!(
                "{cell} is a known mine and cannot become safe"
            )));
        }
        if !self.known_safe.insert(cell) {
            return Ok(false);
        }
        for constraint in &mut self.constraints {
            constraint.resolve_safe(cell)?;
        }
        Ok(true)
    }

    /// Adds a constraint after stripping the cells whose status is already known.
    /// Does not propagate. Returns whether the constraint was new.
    pub fn add_constraint(&mut self, mut constraint: Constraint) -> Result<bool, KnowledgeError> {
        for &cell in constraint.cells() {
            self.check_bounds(cell)?;
        }

        let mines: Vec<Cell> = constraint.cells().intersection(&self.known_mines).copied().collect();
        let safe: Vec<Cell> = constraint.cells().intersection(&self.known_safe).copied().collect();
        for cell in mines {
            constraint.resolve_mine(cell)?;
        }
        for cell in safe {
            constraint.resolve_safe(cell)?;
        }

        if constraint.is_empty() || self.constraints.contains(&constraint) {
            return Ok(false);
        }
        self.constraints.push(constraint);
        Ok(true)
    }

    /// Alternates direct deduction and subset resolution until a full round changes
    /// nothing.
    ///
    /// Terminates because every round either learns a new fact (a finite supply of cells)
    /// or adds a constraint not already present (a finite supply of subsets and counts).
    pub fn propagate_to_fixed_point(&mut self) -> Result<(), KnowledgeError> {
        loop {
            let mut changed = self.apply_direct_deductions()?;
            self.prune();
            changed |= self.apply_subset_resolution()?;
            self.prune();

            if !changed {
                return Ok(());
            }
        }
    }

    /// Collects every fact the live constraints state outright, then marks them all.
    fn apply_direct_deductions(&mut self) -> Result<bool, KnowledgeError> {
        let mut mines = BTreeSet::new();
        let mut safe = BTreeSet::new();
        for constraint in &self.constraints {
            mines.extend(constraint.deduce_mines());
            safe.extend(constraint.deduce_safe());
        }

        if let Some(cell) = mines.intersection(&safe).next() {
            return Err(KnowledgeError::inconsistent(format!(
                "{cell} is deduced to be both a mine and safe"
            )));
        }

        let mut changed = false;
        for cell in mines {
            changed |= self.mark_mine(cell)?;
        }
        for cell in safe {
            changed |= self.mark_safe(cell)?;
        }
        Ok(changed)
    }

    /// Derives `B - A` for every pair of live constraints with `A ⊂ B`, keeping only
    /// constraints not already present.
    fn apply_subset_resolution(&mut self) -> Result<bool, KnowledgeError> {
        let mut derived: Vec<Constraint> = Vec::new();
        for (a, b) in self.constraints.iter().tuple_combinations::<(_, _)>() {
            for candidate in [b.subtract(a)?, a.subtract(b)?].into_iter().flatten() {
                if !self.constraints.contains(&candidate) && !derived.contains(&candidate) {
                    derived.push(candidate);
                }
            }
        }

        let changed = !derived.is_empty();
        self.constraints.extend(derived);
        Ok(changed)
    }

    /// Drops fully resolved constraints and duplicates left behind by resolution.
    /// An empty constraint always has a zero count, which `Constraint` guarantees.
    fn prune(&mut self) {
        let mut live: Vec<Constraint> = Vec::with_capacity(self.constraints.len());
        for constraint in self.constraints.drain(..) {
            if !constraint.is_empty() && !live.contains(&constraint) {
                live.push(constraint);
            }
        }
        self.constraints = live;
    }

    /// A known safe cell that has not been probed yet, lowest in row-major order.
    pub fn make_safe_move(&self) -> Option<Cell> {
        self.known_safe.difference(&self.moves_made).next().copied()
    }

    /// A uniformly random cell that is neither probed nor a known mine.
    pub fn make_random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        let candidates: Vec<Cell> = self
            .dimensions
            .cells()
            .filter(|cell| !self.moves_made.contains(cell) && !self.known_mines.contains(cell))
            .collect();
        candidates.choose(rng).copied()
    }

    fn check_bounds(&self, cell: Cell) -> Result<(), KnowledgeError> {
        if self.dimensions.contains(cell) {
            Ok(())
        } else {
            Err(invalid_move(
                cell,
                InvalidMove::OutOfBounds {
                    height: self.dimensions.height,
                    width: self.dimensions.width,
                },
            ))
        }
    }
}

fn invalid_move(cell: Cell, reason: InvalidMove) -> KnowledgeError {
    KnowledgeError::InvalidMove { cell, reason }
}
