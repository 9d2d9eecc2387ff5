//! Core match logic module - pure, deterministic, and testable
//!
//! This module contains the Gomoku rules and match state. It has **zero
//! dependencies** on networking or I/O, making it:
//!
//! - **Deterministic**: The same sequence of calls always yields the same state
//! - **Testable**: Every rule is covered by unit and property tests
//! - **Transport-agnostic**: The dispatcher decides who hears each announcement
//!
//! # Module Structure
//!
//! - [`board`]: 15x15 grid with anchored run counting and text rendering
//! - [`match_state`]: Seats, turn arbitration, move legality, win detection
//! - [`snapshot`]: Structured view of a match for observers
//! - [`error`]: Validation failures returned by match operations
//!
//! # Rules
//!
//! - **Seats**: Exactly two; the first to join plays ● and moves first
//! - **Moves**: Only the due seat may move, on an empty cell inside 0..=14
//! - **Win**: Five or more contiguous marks on a row, column or diagonal
//! - **No draws**: A full board simply rejects every further move
//! - **Rematch**: `start` again reuses the same seats and marks
//!
//! # Example
//!
//! ```
//! use gomoku_core::Match;
//! use gomoku_types::{ClientId, MoveOutcome};
//!
//! let (alice, bob) = (ClientId(1), ClientId(2));
//! let mut game = Match::new();
//! game.join(alice, "Alice").unwrap();
//! game.join(bob, "Bob").unwrap();
//! game.start().unwrap();
//!
//! for col in 3..7 {
//!     game.place_move(alice, 7, col).unwrap();
//!     game.place_move(bob, 0, col).unwrap();
//! }
//! let report = game.place_move(alice, 7, 7).unwrap();
//! assert_eq!(report.outcome, MoveOutcome::Win);
//! assert!(!game.is_in_progress());
//! ```

pub mod board;
pub mod error;
pub mod match_state;
pub mod snapshot;

pub use gomoku_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use error::MatchError;
pub use match_state::{Match, MoveReport, Seat};
pub use snapshot::{MatchSnapshot, SeatSnapshot};
