//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (match engine, dispatcher, wire protocol, client).
//!
//! # Board Dimensions
//!
//! Gomoku is played on a square 15x15 grid:
//!
//! - **Rows**: indexed 0-14 (top to bottom)
//! - **Columns**: indexed 0-14 (left to right)
//! - **Win**: five or more marks in a contiguous line on any axis
//!
//! # Match Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `BOARD_SIZE` | 15 | Side length of the board |
//! | `WIN_LENGTH` | 5 | Run length that wins the match |
//! | `MAX_SEATS` | 2 | Seats per match |
//!
//! # Examples
//!
//! ```
//! use gomoku_types::{Mark, MatchPhase, BOARD_SIZE};
//!
//! // Marks are handed out in registration order
//! assert_eq!(Mark::for_seat(0), Mark::Black);
//! assert_eq!(Mark::for_seat(1), Mark::White);
//! assert_eq!(Mark::Black.symbol(), '●');
//!
//! // Board dimensions
//! assert_eq!(BOARD_SIZE, 15);
//! assert_eq!(MatchPhase::Empty.as_str(), "empty");
//! ```

/// Board side length (15 rows and 15 columns)
pub const BOARD_SIZE: usize = 15;

/// Total number of cells on the board
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// Contiguous marks needed to win
pub const WIN_LENGTH: usize = 5;

/// Seats per match
pub const MAX_SEATS: usize = 2;

/// Opaque identity of a connected client.
///
/// The engine only compares identities; it never looks anything up through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Symbol a seat places on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    /// First registrant, moves first
    Black,
    /// Second registrant
    White,
}

impl Mark {
    /// Mark assigned to the seat at `index` when a match starts
    pub fn for_seat(index: usize) -> Self {
        if index == 0 {
            Mark::Black
        } else {
            Mark::White
        }
    }

    /// Display symbol
    pub fn symbol(&self) -> char {
        match self {
            Mark::Black => '●',
            Mark::White => '○',
        }
    }

    /// Numeric code used in compact grids (0 is reserved for empty)
    pub fn code(&self) -> u8 {
        match self {
            Mark::Black => 1,
            Mark::White => 2,
        }
    }

    /// Convert to lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            Mark::Black => "black",
            Mark::White => "white",
        }
    }
}

/// Cell on the board (None = empty, Some = holds a mark)
pub type Cell = Option<Mark>;

/// One entry of the append-only move log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveRecord {
    pub row: usize,
    pub col: usize,
    pub mark: Mark,
}

/// Result of an accepted move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveOutcome {
    /// No five-in-a-row yet; the other seat is now due
    Continue,
    /// The moving seat completed a run of five or more
    Win,
}

/// Lifecycle phase of a match, derived from its seats and flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchPhase {
    /// No seats taken
    Empty,
    /// One seat taken
    Filling,
    /// Both seats taken, never started
    Ready,
    /// Moves are being accepted
    InProgress,
    /// Last match ended with a win (or was aborted); `start` begins a rematch
    Finished,
}

impl MatchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPhase::Empty => "empty",
            MatchPhase::Filling => "filling",
            MatchPhase::Ready => "ready",
            MatchPhase::InProgress => "in_progress",
            MatchPhase::Finished => "finished",
        }
    }
}

/// Render a coordinate as a single display digit (0-9 then A-E).
///
/// This is a compact display convention only; canonical coordinates are plain integers.
pub fn coord_digit(index: usize) -> char {
    std::char::from_digit(index as u32, 16)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('?')
}
