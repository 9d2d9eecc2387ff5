use crate::types::{ClientId, Mark, MatchPhase, MoveRecord, BOARD_SIZE};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeatSnapshot {
    pub identity: ClientId,
    pub name: String,
    pub mark: Option<Mark>,
}

/// Structured view of a match, refreshed after every state change
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchSnapshot {
    /// 0 = empty, otherwise `Mark::code`
    pub board: [[u8; BOARD_SIZE]; BOARD_SIZE],
    pub phase: MatchPhase,
    pub in_progress: bool,
    /// Seat index due to move, only while in progress
    pub turn: Option<usize>,
    pub winner: Option<usize>,
    pub move_count: usize,
    pub last_move: Option<MoveRecord>,
    pub seats: Vec<SeatSnapshot>,
}

impl Default for MatchSnapshot {
    fn default() -> Self {
        Self {
            board: [[0u8; BOARD_SIZE]; BOARD_SIZE],
            phase: MatchPhase::Empty,
            in_progress: false,
            turn: None,
            winner: None,
            move_count: 0,
            last_move: None,
            seats: Vec::new(),
        }
    }
}
