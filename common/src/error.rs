use crate::grid::Cell;
use thiserror::Error;

/// Errors raised by the inference engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KnowledgeError {
    /// The caller asked for a move the engine cannot accept. Retrying the same call fails again.
    #[error("invalid move at {cell}: {reason}")]
    InvalidMove { cell: Cell, reason: InvalidMove },
    /// The knowledge base contradicts itself. This is a bug in propagation, or the result
    /// of injecting hand-built constraints that no board could produce.
    #[error("internal consistency failure: {0}")]
    InternalConsistency(String),
}

/// Why a move was rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvalidMove {
    #[error("cell has already been probed")]
    AlreadyMoved,
    #[error("cell lies outside the {height}x{width} board")]
    OutOfBounds { height: usize, width: usize },
    #[error("cell is a known mine")]
    KnownMine,
    #[error("mine count {count} is impossible, expected between {min} and {max}")]
    MineCountOutOfRange { count: usize, min: usize, max: usize },
}

impl KnowledgeError {
    pub fn is_invalid_move(&self) -> bool {
        matches!(self, KnowledgeError::InvalidMove { .. })
    }

    pub(crate) fn inconsistent(message: impl Into<String>) -> Self {
        KnowledgeError::InternalConsistency(message.into())
    }
}
