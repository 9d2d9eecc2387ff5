//! Text command parser
//!
//! Maps what a player types into a typed [`Command`]. The verb is matched
//! case-insensitively; arguments are separated by whitespace.

use thiserror::Error;

/// A parsed player command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Join { name: String },
    Start,
    Place { row: i32, col: i32 },
    Board,
    Players,
    History,
    Clear,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("coordinates must be numbers (0-14 or 0-E)")]
    InvalidCoordinate,

    #[error("unknown command: {0}, type @h for help")]
    Unknown(String),
}

pub const HELP_TEXT: &str = "\
Available commands:
  @j <name>       - join the game (e.g. @j alice)
  @s              - start the game (needs 2 players)
  @p <row> <col>  - place a stone (e.g. @p 7 7 for the center)
  @b              - show the board
  @l              - list players
  @m              - show move history
  @c              - clear the screen
  @h              - show this help

Coordinates: rows and columns are 0-14 (single digits may be written in hex 0-E)";

/// Parse a line of input. Blank input yields `Ok(None)`.
pub fn parse_command(input: &str) -> Result<Option<Command>, CommandError> {
    let mut parts = input.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "@h" | "help" => Command::Help,
        "@j" => {
            let name = parts.next().ok_or(CommandError::Usage("@j <name>"))?;
            Command::Join {
                name: name.to_string(),
            }
        }
        "@s" => Command::Start,
        "@p" => {
            let (Some(row), Some(col)) = (parts.next(), parts.next()) else {
                return Err(CommandError::Usage("@p <row> <col> (e.g. @p 7 7)"));
            };
            Command::Place {
                row: parse_coordinate(row)?,
                col: parse_coordinate(col)?,
            }
        }
        "@b" => Command::Board,
        "@l" => Command::Players,
        "@m" => Command::History,
        "@c" => Command::Clear,
        _ => return Err(CommandError::Unknown(verb.to_string())),
    };
    Ok(Some(command))
}

/// A single character is read as a hex digit, anything longer as a decimal integer.
///
/// Range checking is left to the match engine.
pub fn parse_coordinate(token: &str) -> Result<i32, CommandError> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c
            .to_digit(16)
            .map(|d| d as i32)
            .ok_or(CommandError::InvalidCoordinate),
        _ => token
            .parse::<i32>()
            .map_err(|_| CommandError::InvalidCoordinate),
    }
}
