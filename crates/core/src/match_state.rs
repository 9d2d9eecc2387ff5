//! Match state module - the Gomoku match engine
//!
//! Owns the board, the two seats, turn order and the move log. Every operation is
//! synchronous and validates fully before mutating, so a rejected call never
//! leaves a partial change behind.

use arrayvec::ArrayVec;
use tracing::{debug, info};

use crate::board::Board;
use crate::error::{MatchError, Result};
use crate::snapshot::{MatchSnapshot, SeatSnapshot};
use crate::types::{ClientId, Mark, MatchPhase, MoveOutcome, MoveRecord, MAX_SEATS};

/// One of the two participant slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    /// Handle into the session layer; only ever compared
    pub identity: ClientId,
    pub name: String,
    /// Assigned when a match starts
    pub mark: Option<Mark>,
}

/// Accepted move with its announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub message: String,
    pub outcome: MoveOutcome,
    pub record: MoveRecord,
}

/// A single two-seat Gomoku match
#[derive(Debug, Clone, Default)]
pub struct Match {
    board: Board,
    /// Registration order is seat order
    seats: ArrayVec<Seat, MAX_SEATS>,
    turn: usize,
    in_progress: bool,
    /// Seat index that won the most recent match
    winner: Option<usize>,
    /// Set once `start` has succeeded; distinguishes Ready from Finished
    started_once: bool,
    history: Vec<MoveRecord>,
}

impl Match {
    /// Create an empty match with no seats
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a free seat for `identity`
    pub fn join(&mut self, identity: ClientId, name: &str) -> Result<String> {
        if let Some(seat) = self.seats.iter().find(|s| s.identity == identity) {
            return Err(MatchError::AlreadySeated {
                name: seat.name.clone(),
            });
        }
        if self.seats.is_full() {
            return Err(MatchError::seats_full());
        }

        self.seats.push(Seat {
            identity,
            name: name.to_string(),
            mark: None,
        });
        debug!(%identity, name, seats = self.seats.len(), "seat taken");
        Ok(format!("{} joined the game", name))
    }

    /// Release the seat held by `identity`.
    ///
    /// A match in progress is aborted without a winner. Returns an announcement
    /// when a seat was actually freed.
    pub fn leave(&mut self, identity: ClientId) -> Option<String> {
        let index = self.seat_of(identity)?;
        let seat = self.seats.remove(index);

        let aborted = self.in_progress;
        self.in_progress = false;
        self.winner = None;
        self.started_once = false;
        self.turn = 0;
        // Remaining seat moves to index 0 and loses its mark until the next start.
        for s in self.seats.iter_mut() {
            s.mark = None;
        }

        info!(identity = %seat.identity, name = %seat.name, aborted, "seat released");
        if aborted {
            Some(format!("{} left the game, match aborted", seat.name))
        } else {
            Some(format!("{} left the game", seat.name))
        }
    }

    /// Begin a new match with the two registered seats
    pub fn start(&mut self) -> Result<String> {
        if self.seats.len() != MAX_SEATS {
            return Err(MatchError::InvalidSeatCount {
                required: MAX_SEATS,
                actual: self.seats.len(),
            });
        }

        self.board.clear();
        self.history.clear();
        self.turn = 0;
        self.winner = None;
        self.in_progress = true;
        self.started_once = true;
        for (index, seat) in self.seats.iter_mut().enumerate() {
            seat.mark = Some(Mark::for_seat(index));
        }

        let (a, b) = (&self.seats[0], &self.seats[1]);
        info!(first = %a.name, second = %b.name, "match started");
        Ok(format!(
            "Game started! {}({}) vs {}({})",
            a.name,
            Mark::for_seat(0).symbol(),
            b.name,
            Mark::for_seat(1).symbol()
        ))
    }

    /// Place the due seat's mark at (row, col).
    ///
    /// Checks run in a fixed order and the first failure wins: match in progress,
    /// caller is due, coordinates on the board, cell empty.
    pub fn place_move(&mut self, identity: ClientId, row: i32, col: i32) -> Result<MoveReport> {
        if !self.in_progress {
            return Err(MatchError::MatchNotStarted);
        }

        let due = &self.seats[self.turn];
        if due.identity != identity {
            return Err(MatchError::OutOfTurn {
                expected: due.name.clone(),
            });
        }

        if !Board::in_bounds(row, col) {
            return Err(MatchError::OutOfBounds { row, col });
        }

        if self.board.is_occupied(row, col) {
            return Err(MatchError::CellOccupied {
                row: row as usize,
                col: col as usize,
            });
        }

        let mark = due.mark.unwrap_or_else(|| Mark::for_seat(self.turn));
        self.board.set(row, col, Some(mark));
        let record = MoveRecord {
            row: row as usize,
            col: col as usize,
            mark,
        };
        self.history.push(record);
        debug!(row, col, mark = mark.as_str(), moves = self.history.len(), "move placed");

        if self.board.completes_line(row, col) {
            self.in_progress = false;
            self.winner = Some(self.turn);
            let name = &self.seats[self.turn].name;
            info!(winner = %name, moves = self.history.len(), "match won");
            return Ok(MoveReport {
                message: format!("Congratulations, {} wins!", name),
                outcome: MoveOutcome::Win,
                record,
            });
        }

        self.turn = 1 - self.turn;
        Ok(MoveReport {
            message: format!("Move accepted! {} to move", self.seats[self.turn].name),
            outcome: MoveOutcome::Continue,
            record,
        })
    }

    /// Text snapshot of the board with a coordinate header
    pub fn render_board(&self) -> String {
        self.board.render()
    }

    /// Player list, one seat per line
    pub fn render_seats(&self) -> String {
        self.seats
            .iter()
            .map(|s| match s.mark {
                Some(mark) => format!("- {} {}", s.name, mark.symbol()),
                None => format!("- {}", s.name),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Numbered move log, one move per line
    pub fn render_history(&self) -> String {
        self.history
            .iter()
            .enumerate()
            .map(|(i, m)| format!("{}. ({},{}) {}", i + 1, m.row, m.col, m.mark.symbol()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Ordered move log of the current (or last) match
    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn last_move(&self) -> Option<MoveRecord> {
        self.history.last().copied()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    /// Seat index held by `identity`
    pub fn seat_of(&self, identity: ClientId) -> Option<usize> {
        self.seats.iter().position(|s| s.identity == identity)
    }

    pub fn is_seated(&self, identity: ClientId) -> bool {
        self.seat_of(identity).is_some()
    }

    /// Index of the seat whose turn it is
    pub fn turn(&self) -> usize {
        self.turn
    }

    /// Seat due to move, if a match is in progress
    pub fn current_seat(&self) -> Option<&Seat> {
        if self.in_progress {
            self.seats.get(self.turn)
        } else {
            None
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    /// Seat that won the most recent match
    pub fn winner(&self) -> Option<&Seat> {
        self.winner.and_then(|i| self.seats.get(i))
    }

    pub fn phase(&self) -> MatchPhase {
        if self.in_progress {
            return MatchPhase::InProgress;
        }
        match self.seats.len() {
            0 => MatchPhase::Empty,
            1 => MatchPhase::Filling,
            _ if self.started_once => MatchPhase::Finished,
            _ => MatchPhase::Ready,
        }
    }

    pub fn snapshot_into(&self, out: &mut MatchSnapshot) {
        self.board.write_u8_grid(&mut out.board);
        out.phase = self.phase();
        out.in_progress = self.in_progress;
        out.turn = self.current_seat().map(|_| self.turn);
        out.winner = self.winner;
        out.move_count = self.history.len();
        out.last_move = self.last_move();
        out.seats.clear();
        out.seats.extend(self.seats.iter().map(|s| SeatSnapshot {
            identity: s.identity,
            name: s.name.clone(),
            mark: s.mark,
        }));
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        let mut s = MatchSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }
}
