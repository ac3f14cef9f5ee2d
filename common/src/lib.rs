//! Minesweeper inference engine.
//!
//! [`KnowledgeBase`] accumulates "exactly N of these cells are mines" [`Constraint`]s from
//! revealed cells and propagates them to a fixed point, never declaring a cell a mine or
//! safe unless it follows from the observations. [`Board`] and [`Game`] supply the ground
//! truth and the bot loop around it; [`sat`] audits the engine against exact deduction.

pub mod board;
pub mod constraint;
pub mod error;
pub mod game;
pub mod grid;
pub mod knowledge;
pub mod sat;

pub use board::Board;
pub use constraint::Constraint;
pub use error::{InvalidMove, KnowledgeError};
pub use game::{CellView, Game, GameConfig, GameState, Move, MoveKind, Outcome, Turn};
pub use grid::{Cell, Dimensions};
pub use knowledge::KnowledgeBase;
pub use sat::{Audit, DeducedState};
