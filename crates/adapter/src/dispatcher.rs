//! Command dispatcher
//!
//! Owns the match and turns a (client, command) pair into the deliveries the
//! server should send. This is the only place the match is mutated from, so the
//! runtime serializes access simply by calling it from a single task.

use arrayvec::ArrayVec;
use tracing::debug;

use crate::command::{parse_command, Command, HELP_TEXT};
use crate::core::Match;
use crate::types::{ClientId, MoveOutcome};

/// Upper bound on deliveries produced by one command
pub const MAX_DELIVERIES: usize = 4;

pub type Deliveries = ArrayVec<Delivery, MAX_DELIVERIES>;

/// One outbound unit produced by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Text for a single client
    ToClient { client_id: ClientId, text: String },
    /// Text for every connected client
    Broadcast { text: String },
    /// Clear a single client's terminal
    Clear { client_id: ClientId },
    /// Match state changed; push a fresh snapshot to subscribers
    State,
}

/// Connection greeting sent right after the handshake
pub const GREETING: &str = "Welcome to the Gomoku terminal! Type @h for commands";

const JOIN_FIRST: &str = "Join the game first (@j <name>)";

#[derive(Debug, Default)]
pub struct Dispatcher {
    game: Match,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn game(&self) -> &Match {
        &self.game
    }

    /// Parse and execute a raw text line from `client_id`
    pub fn handle_line(&mut self, client_id: ClientId, line: &str) -> Deliveries {
        match parse_command(line) {
            Ok(Some(command)) => self.handle(client_id, command),
            Ok(None) => Deliveries::new(),
            // Seat check comes before argument checks for moves.
            Err(_) if is_place_verb(line) && !self.game.is_seated(client_id) => {
                reply(client_id, JOIN_FIRST.to_string())
            }
            Err(e) => reply(client_id, e.to_string()),
        }
    }

    /// Execute a parsed command
    pub fn handle(&mut self, client_id: ClientId, command: Command) -> Deliveries {
        debug!(client = %client_id, ?command, "dispatch");
        match command {
            Command::Help => reply(client_id, HELP_TEXT.to_string()),
            Command::Join { name } => self.join(client_id, &name),
            Command::Players => {
                if self.game.seats().is_empty() {
                    reply(client_id, "No players yet".to_string())
                } else {
                    reply(
                        client_id,
                        format!("Current players:\n{}", self.game.render_seats()),
                    )
                }
            }
            Command::Start => self.start(client_id),
            Command::Board => self.board(client_id),
            Command::Place { row, col } => self.place(client_id, row, col),
            Command::History => {
                if self.game.history().is_empty() {
                    reply(client_id, "No moves yet".to_string())
                } else {
                    reply(
                        client_id,
                        format!("Move history:\n{}", self.game.render_history()),
                    )
                }
            }
            Command::Clear => {
                let mut out = Deliveries::new();
                out.push(Delivery::Clear { client_id });
                out
            }
        }
    }

    /// Release whatever seat the disconnected client held
    pub fn disconnect(&mut self, client_id: ClientId) -> Deliveries {
        let mut out = Deliveries::new();
        if let Some(note) = self.game.leave(client_id) {
            out.push(Delivery::Broadcast { text: note });
            out.push(Delivery::State);
        }
        out
    }

    fn join(&mut self, client_id: ClientId, name: &str) -> Deliveries {
        match self.game.join(client_id, name) {
            Ok(note) => {
                let mut out = Deliveries::new();
                out.push(Delivery::ToClient {
                    client_id,
                    text: format!("{}!", note),
                });
                out.push(Delivery::Broadcast {
                    text: format!("Player {} joined the game", name),
                });
                out.push(Delivery::State);
                out
            }
            Err(e) => reply(client_id, e.to_string()),
        }
    }

    fn start(&mut self, client_id: ClientId) -> Deliveries {
        if !self.game.is_seated(client_id) {
            return reply(client_id, JOIN_FIRST.to_string());
        }
        match self.game.start() {
            Ok(note) => {
                let mut out = Deliveries::new();
                out.push(Delivery::Broadcast { text: note });
                out.push(Delivery::Broadcast {
                    text: format!("\n{}", self.game.render_board()),
                });
                if let Some(first) = self.game.current_seat() {
                    out.push(Delivery::Broadcast {
                        text: format!("\n{} moves first!", first.name),
                    });
                }
                out.push(Delivery::State);
                out
            }
            Err(e) => reply(client_id, e.to_string()),
        }
    }

    fn board(&self, client_id: ClientId) -> Deliveries {
        if !self.game.is_in_progress() {
            return reply(client_id, "The game has not started yet".to_string());
        }
        let mut out = Deliveries::new();
        out.push(Delivery::ToClient {
            client_id,
            text: format!("\n{}", self.game.render_board()),
        });
        if let Some(seat) = self.game.current_seat() {
            out.push(Delivery::ToClient {
                client_id,
                text: format!("Current turn: {}", seat.name),
            });
        }
        out
    }

    fn place(&mut self, client_id: ClientId, row: i32, col: i32) -> Deliveries {
        if !self.game.is_seated(client_id) {
            return reply(client_id, JOIN_FIRST.to_string());
        }
        match self.game.place_move(client_id, row, col) {
            Ok(report) => {
                let mut out = Deliveries::new();
                out.push(Delivery::Broadcast {
                    text: report.message,
                });
                out.push(Delivery::Broadcast {
                    text: format!("\n{}", self.game.render_board()),
                });
                if report.outcome == MoveOutcome::Win {
                    out.push(Delivery::Broadcast {
                        text: "Type @s for a rematch".to_string(),
                    });
                }
                out.push(Delivery::State);
                out
            }
            Err(e) => reply(client_id, e.to_string()),
        }
    }
}

fn is_place_verb(line: &str) -> bool {
    line.split_whitespace()
        .next()
        .is_some_and(|verb| verb.eq_ignore_ascii_case("@p"))
}

fn reply(client_id: ClientId, text: String) -> Deliveries {
    let mut out = Deliveries::new();
    out.push(Delivery::ToClient { client_id, text });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: ClientId = ClientId(1);
    const B: ClientId = ClientId(2);
    const C: ClientId = ClientId(3);

    fn texts_to(out: &Deliveries, who: ClientId) -> Vec<&str> {
        out.iter()
            .filter_map(|d| match d {
                Delivery::ToClient { client_id, text } if *client_id == who => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn broadcasts(out: &Deliveries) -> Vec<&str> {
        out.iter()
            .filter_map(|d| match d {
                Delivery::Broadcast { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn seated_pair() -> Dispatcher {
        let mut d = Dispatcher::new();
        d.handle_line(A, "@j Alice");
        d.handle_line(B, "@j Bob");
        d
    }

    #[test]
    fn test_join_confirms_and_broadcasts() {
        let mut d = Dispatcher::new();
        let out = d.handle_line(A, "@j Alice");
        assert_eq!(texts_to(&out, A), vec!["Alice joined the game!"]);
        assert_eq!(broadcasts(&out), vec!["Player Alice joined the game"]);
        assert!(out.contains(&Delivery::State));
    }

    #[test]
    fn test_third_player_is_turned_away() {
        let mut d = seated_pair();
        let out = d.handle_line(C, "@j Carol");
        assert_eq!(
            texts_to(&out, C),
            vec!["the game is full, only 2 players can join"]
        );
        assert!(broadcasts(&out).is_empty());
    }

    #[test]
    fn test_unseated_client_cannot_start_or_move() {
        let mut d = seated_pair();
        let out = d.handle_line(C, "@s");
        assert_eq!(texts_to(&out, C), vec![JOIN_FIRST]);
        assert!(!d.game().is_in_progress());

        d.handle_line(A, "@s");
        let out = d.handle_line(C, "@p 7 7");
        assert_eq!(texts_to(&out, C), vec![JOIN_FIRST]);
        assert!(d.game().history().is_empty());
    }

    #[test]
    fn test_start_broadcasts_board_and_first_mover() {
        let mut d = seated_pair();
        let out = d.handle_line(B, "@s");
        let b = broadcasts(&out);
        assert_eq!(b[0], "Game started! Alice(●) vs Bob(○)");
        assert!(b[1].starts_with("\n   0 1 2"));
        assert_eq!(b[2], "\nAlice moves first!");
        assert_eq!(out.last(), Some(&Delivery::State));
    }

    #[test]
    fn test_board_before_start() {
        let mut d = seated_pair();
        let out = d.handle_line(A, "@b");
        assert_eq!(texts_to(&out, A), vec!["The game has not started yet"]);
    }

    #[test]
    fn test_board_shows_current_turn() {
        let mut d = seated_pair();
        d.handle_line(A, "@s");
        d.handle_line(A, "@p 7 7");
        let out = d.handle_line(B, "@b");
        let texts = texts_to(&out, B);
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[1], "Current turn: Bob");
    }

    #[test]
    fn test_rejected_move_only_answers_sender() {
        let mut d = seated_pair();
        d.handle_line(A, "@s");
        let out = d.handle_line(B, "@p 7 7");
        assert_eq!(texts_to(&out, B), vec!["it is Alice's turn"]);
        assert!(broadcasts(&out).is_empty());
        assert!(!out.contains(&Delivery::State));
    }

    #[test]
    fn test_winning_move_is_broadcast() {
        let mut d = seated_pair();
        d.handle_line(A, "@s");
        for col in 3..7 {
            d.handle_line(A, &format!("@p 7 {}", col));
            d.handle_line(B, &format!("@p 0 {}", col));
        }
        let out = d.handle_line(A, "@p 7 7");
        let b = broadcasts(&out);
        assert_eq!(b[0], "Congratulations, Alice wins!");
        assert_eq!(b[2], "Type @s for a rematch");
        assert!(!d.game().is_in_progress());
    }

    #[test]
    fn test_history_and_players() {
        let mut d = Dispatcher::new();
        assert_eq!(texts_to(&d.handle_line(A, "@l"), A), vec!["No players yet"]);
        assert_eq!(texts_to(&d.handle_line(A, "@m"), A), vec!["No moves yet"]);

        d.handle_line(A, "@j Alice");
        d.handle_line(B, "@j Bob");
        d.handle_line(A, "@s");
        d.handle_line(A, "@p 7 7");
        assert_eq!(
            texts_to(&d.handle_line(B, "@l"), B),
            vec!["Current players:\n- Alice ●\n- Bob ○"]
        );
        assert_eq!(
            texts_to(&d.handle_line(B, "@m"), B),
            vec!["Move history:\n1. (7,7) ●"]
        );
    }

    #[test]
    fn test_parse_errors_reply_to_sender() {
        let mut d = Dispatcher::new();
        assert_eq!(
            texts_to(&d.handle_line(A, "@p 7"), A),
            vec!["usage: @p <row> <col> (e.g. @p 7 7)"]
        );
        assert_eq!(
            texts_to(&d.handle_line(A, "hello"), A),
            vec!["unknown command: hello, type @h for help"]
        );
        assert!(d.handle_line(A, "  ").is_empty());
    }

    #[test]
    fn test_unseated_bad_move_asks_to_join_first() {
        let mut d = seated_pair();
        assert_eq!(texts_to(&d.handle_line(C, "@p 7"), C), vec![JOIN_FIRST]);
        assert_eq!(texts_to(&d.handle_line(C, "@P x y"), C), vec![JOIN_FIRST]);
        // Seated players still get the argument error.
        assert_eq!(
            texts_to(&d.handle_line(A, "@p x 7"), A),
            vec!["coordinates must be numbers (0-14 or 0-E)"]
        );
    }

    #[test]
    fn test_clear_targets_sender() {
        let mut d = Dispatcher::new();
        let out = d.handle_line(A, "@c");
        assert_eq!(out.as_slice(), &[Delivery::Clear { client_id: A }]);
    }

    #[test]
    fn test_disconnect_frees_seat() {
        let mut d = seated_pair();
        d.handle_line(A, "@s");
        let out = d.disconnect(B);
        assert_eq!(broadcasts(&out), vec!["Bob left the game, match aborted"]);
        assert_eq!(d.game().seats().len(), 1);
        assert!(d.disconnect(C).is_empty());
    }
}
