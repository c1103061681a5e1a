use crate::board::{Color, Square};
use thiserror::Error;

/// Errors raised by layout loading and background search.
///
/// Off-board probing and illegal gestures are not errors: position queries
/// answer `None` for them and the selection protocol ignores them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChessError {
    #[error("unknown piece kind: {0}")]
    UnknownPieceKind(String),

    #[error("invalid square: {0}")]
    InvalidSquare(String),

    #[error("square {0} is already occupied in the layout")]
    SquareOccupied(Square),

    #[error("layout must contain exactly one {0} king")]
    MissingKing(Color),

    #[error("layout line {line}: {reason}")]
    InvalidLayoutLine { line: usize, reason: String },

    #[error("search was cancelled")]
    SearchCancelled,
}

pub type Result<T> = std::result::Result<T, ChessError>;
