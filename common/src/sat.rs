//! Exact deduction over the same observations the knowledge base sees.
//!
//! Propagation by direct deduction and subset resolution is sound but incomplete. This
//! module encodes every revealed count as a cardinality constraint for a SAT solver and
//! asks, cell by cell, whether the cell can be a mine and whether it can be safe. The
//! answers are the ground truth the engine's facts are audited against.

use crate::grid::{Cell, Dimensions};
use crate::knowledge::KnowledgeBase;
use itertools::Itertools;
use std::collections::{BTreeMap, HashMap};
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

/// What the observations force for a single unrevealed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeducedState {
    ForcedMine,
    ForcedSafe,
    Undetermined,
}

/// Comparison of the engine's facts with exact deduction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Audit {
    /// Engine facts the observations do not force. Always empty for a sound engine.
    pub unsound: Vec<Cell>,
    /// Forced mines the engine has not found.
    pub missed_mines: usize,
    /// Forced safe cells the engine has not found.
    pub missed_safe: usize,
}

impl Audit {
    pub fn is_sound(&self) -> bool {
        self.unsound.is_empty()
    }
}

/// Classifies every unrevealed cell next to a revealed one.
///
/// `revealed` maps each probed cell to its neighbour mine count. Cells with no revealed
/// neighbour are unconstrained and left out.
pub fn analyze(
    dimensions: Dimensions,
    revealed: &BTreeMap<Cell, usize>,
) -> anyhow::Result<BTreeMap<Cell, DeducedState>> {
    let mut solver = Solver::new();
    let mut var_map: HashMap<Cell, Var> = HashMap::new();
    let mut formula = CnfFormula::new();

    for (&cell, &count) in revealed {
        let mut lits = Vec::new();
        for neighbor in dimensions.neighbors(cell) {
            if revealed.contains_key(&neighbor) {
                continue;
            }
            let var = *var_map.entry(neighbor).or_insert_with(|| solver.new_var());
            lits.push(Lit::from_var(var, true));
        }
        encode_exactly_k(&mut formula, &lits, count);
    }

    solver.add_formula(&formula);
    if !solver.solve()? {
        anyhow::bail!("observations admit no mine layout");
    }

    let mut deductions = BTreeMap::new();
    for (&cell, &var) in &var_map {
        let mine_possible = solve_assuming(&mut solver, Lit::from_var(var, true))?;
        let safe_possible = solve_assuming(&mut solver, Lit::from_var(var, false))?;

        let state = match (mine_possible, safe_possible) {
            (true, true) => DeducedState::Undetermined,
            (true, false) => DeducedState::ForcedMine,
            (false, true) => DeducedState::ForcedSafe,
            (false, false) => anyhow::bail!("{cell} can be neither a mine nor safe"),
        };
        deductions.insert(cell, state);
    }

    Ok(deductions)
}

/// Checks every fact in `knowledge` against exact deduction from `revealed`.
pub fn audit(knowledge: &KnowledgeBase, revealed: &BTreeMap<Cell, usize>) -> anyhow::Result<Audit> {
    let deductions = analyze(knowledge.dimensions(), revealed)?;
    let state_of = |cell: &Cell| {
        deductions
            .get(cell)
            .copied()
            .unwrap_or(DeducedState::Undetermined)
    };

    let mut report = Audit::default();
    for cell in knowledge.known_mines() {
        if state_of(cell) != DeducedState::ForcedMine {
            report.unsound.push(*cell);
        }
    }
    for cell in knowledge.known_safe() {
        if !revealed.contains_key(cell) && state_of(cell) != DeducedState::ForcedSafe {
            report.unsound.push(*cell);
        }
    }

    for (cell, state) in &deductions {
        match state {
            DeducedState::ForcedMine if !knowledge.known_mines().contains(cell) => {
                report.missed_mines += 1
            }
            DeducedState::ForcedSafe if !knowledge.known_safe().contains(cell) => {
                report.missed_safe += 1
            }
            _ => {}
        }
    }

    Ok(report)
}

fn solve_assuming(solver: &mut Solver, lit: Lit) -> anyhow::Result<bool> {
    solver.assume(&[lit]);
    let result = solver.solve();
    solver.assume(&[]);
    Ok(result?)
}

/// "Exactly k of `lits`" as CNF. A cell has at most 8 neighbours, so the naive
/// combination encoding stays small.
fn encode_exactly_k(formula: &mut CnfFormula, lits: &[Lit], k: usize) {
    if k > lits.len() {
        formula.add_clause(&[]);
        return;
    }

    // At most k: no k + 1 of them are all mines.
    if k < lits.len() {
        for combo in lits.iter().copied().combinations(k + 1) {
            let clause: Vec<Lit> = combo.into_iter().map(|lit| !lit).collect();
            formula.add_clause(&clause);
        }
    }

    // At least k: any n - k + 1 of them contain a mine.
    if k > 0 {
        for combo in lits.iter().copied().combinations(lits.len() - k + 1) {
            formula.add_clause(&combo);
        }
    }
}
