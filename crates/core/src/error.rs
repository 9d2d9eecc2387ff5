use thiserror::Error;

use crate::types::{BOARD_SIZE, MAX_SEATS};

/// Rejection of a match operation.
///
/// Every variant is a local validation failure: the match is left exactly as it
/// was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("exactly {required} players are needed to start (currently {actual})")]
    InvalidSeatCount { required: usize, actual: usize },

    #[error("you have already joined the game as {name}")]
    AlreadySeated { name: String },

    #[error("the game is full, only {capacity} players can join")]
    SeatsFull { capacity: usize },

    #[error("the game has not started yet")]
    MatchNotStarted,

    #[error("it is {expected}'s turn")]
    OutOfTurn { expected: String },

    #[error("coordinates ({row},{col}) out of range (0-{max})", max = BOARD_SIZE - 1)]
    OutOfBounds { row: i32, col: i32 },

    #[error("cell ({row},{col}) is already occupied")]
    CellOccupied { row: usize, col: usize },
}

impl MatchError {
    pub(crate) fn seats_full() -> Self {
        MatchError::SeatsFull {
            capacity: MAX_SEATS,
        }
    }
}

pub type Result<T> = std::result::Result<T, MatchError>;
