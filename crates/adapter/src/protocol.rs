//! Protocol module - JSON message types for terminal clients
//!
//! Implements the line-delimited JSON protocol spoken by the server and the
//! terminal client. All messages have: type, seq (sequence number), ts (timestamp in ms)

use serde::{Deserialize, Serialize};

use crate::core::{MatchSnapshot, SeatSnapshot};
use crate::types::{Mark, MoveRecord, BOARD_SIZE};

/// Protocol version spoken by this build; clients must share the major version
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Game identifier advertised in `welcome`
pub const GAME_ID: &str = "gomoku-term";

// ============== Client -> Server Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HelloType {
    #[serde(rename = "hello")]
    Hello,
}

impl Default for HelloType {
    fn default() -> Self {
        Self::Hello
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandType {
    #[serde(rename = "command")]
    Command,
}

impl Default for CommandType {
    fn default() -> Self {
        Self::Command
    }
}

/// Client hello message (first message to establish connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    #[serde(default)]
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    /// Receive a structured `state` message after every state change
    #[serde(default)]
    pub stream_state: bool,
}

/// Text command typed by the player (e.g. `@p 7 7`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: CommandType,
    pub seq: u64,
    pub ts: u64,
    pub command: String,
}

// ============== Server -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputType {
    #[serde(rename = "output")]
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClearType {
    #[serde(rename = "clear")]
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateType {
    #[serde(rename = "state")]
    State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "invalid_command")]
    InvalidCommand,
    #[serde(rename = "backpressure")]
    Backpressure,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub game_id: String,
}

/// Text shown in the client's terminal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputMessage {
    #[serde(rename = "type")]
    pub msg_type: OutputType,
    pub seq: u64,
    pub ts: u64,
    pub data: String,
}

/// Instruction to clear the client's terminal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearMessage {
    #[serde(rename = "type")]
    pub msg_type: ClearType,
    pub seq: u64,
    pub ts: u64,
}

/// Error message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

/// Structured match state (sent to clients that asked for `stream_state`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMessage {
    #[serde(rename = "type")]
    pub msg_type: StateType,
    pub seq: u64,
    pub ts: u64,
    pub phase: String,
    pub in_progress: bool,
    pub board: BoardGrid,
    pub seats: Vec<SeatEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<u8>,
    pub move_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_move: Option<MoveEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardGrid {
    pub size: u8,
    pub cells: [[u8; BOARD_SIZE]; BOARD_SIZE], // 0 = empty, 1 = black, 2 = white
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatEntry {
    pub client_id: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark: Option<MarkLower>,
}

impl From<&SeatSnapshot> for SeatEntry {
    fn from(value: &SeatSnapshot) -> Self {
        Self {
            client_id: value.identity.0,
            name: value.name.clone(),
            mark: value.mark.map(MarkLower::from),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEntry {
    pub row: u8,
    pub col: u8,
    pub mark: MarkLower,
}

impl From<MoveRecord> for MoveEntry {
    fn from(value: MoveRecord) -> Self {
        Self {
            row: value.row as u8,
            col: value.col as u8,
            mark: value.mark.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkLower {
    #[serde(rename = "black")]
    Black,
    #[serde(rename = "white")]
    White,
}

impl From<Mark> for MarkLower {
    fn from(value: Mark) -> Self {
        match value {
            Mark::Black => Self::Black,
            Mark::White => Self::White,
        }
    }
}

/// Any message the server writes to a client
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServerMessage {
    Welcome(WelcomeMessage),
    Output(OutputMessage),
    Clear(ClearMessage),
    State(StateMessage),
    Error(ErrorMessage),
}

impl ServerMessage {
    pub fn seq(&self) -> u64 {
        match self {
            ServerMessage::Welcome(m) => m.seq,
            ServerMessage::Output(m) => m.seq,
            ServerMessage::Clear(m) => m.seq,
            ServerMessage::State(m) => m.seq,
            ServerMessage::Error(m) => m.seq,
        }
    }
}

// ============== Message Parsing ==============

/// Parse a JSON message from a string
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "command")]
        Command(CommandMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Err(e) => {
            // Unknown message type is not a hard parse error for the protocol.
            #[derive(Debug, Deserialize)]
            struct TypeOnly<'a> {
                #[serde(rename = "type")]
                msg_type: Option<&'a str>,
            }
            let msg_type = serde_json::from_str::<TypeOnly>(json)?
                .msg_type
                .unwrap_or("unknown");
            if msg_type != "hello" && msg_type != "command" {
                #[derive(Debug, Deserialize)]
                struct SeqOnly {
                    seq: Option<u64>,
                }
                let seq = serde_json::from_str::<SeqOnly>(json)?.seq.unwrap_or(0);
                return Ok(ParsedMessage::Unknown(UnknownMessage { seq }));
            }
            Err(e)
        }
    }
}

/// Parsed incoming message
#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

/// Best-effort `seq` extraction from a line that failed to parse
pub fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(|b| b.is_ascii_digit()).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, stream_state: bool) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: PROTOCOL_VERSION.to_string(),
        requested: RequestedCapabilities { stream_state },
    }
}

/// Create a command message
pub fn create_command(seq: u64, command: &str) -> CommandMessage {
    CommandMessage {
        msg_type: CommandType::Command,
        seq,
        ts: current_timestamp_ms(),
        command: command.to_string(),
    }
}

/// Create a welcome message
pub fn create_welcome(seq: u64, protocol_version: &str, client_id: u64) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        game_id: GAME_ID.to_string(),
    }
}

/// Create an output message
pub fn create_output(seq: u64, data: &str) -> OutputMessage {
    OutputMessage {
        msg_type: OutputType::Output,
        seq,
        ts: current_timestamp_ms(),
        data: data.to_string(),
    }
}

/// Create a clear message
pub fn create_clear(seq: u64) -> ClearMessage {
    ClearMessage {
        msg_type: ClearType::Clear,
        seq,
        ts: current_timestamp_ms(),
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Build a state message from a match snapshot
pub fn create_state(seq: u64, snapshot: &MatchSnapshot) -> StateMessage {
    StateMessage {
        msg_type: StateType::State,
        seq,
        ts: current_timestamp_ms(),
        phase: snapshot.phase.as_str().to_string(),
        in_progress: snapshot.in_progress,
        board: BoardGrid {
            size: BOARD_SIZE as u8,
            cells: snapshot.board,
        },
        seats: snapshot.seats.iter().map(SeatEntry::from).collect(),
        turn: snapshot.turn.map(|t| t as u8),
        winner: snapshot.winner.map(|w| w as u8),
        move_count: snapshot.move_count as u32,
        last_move: snapshot.last_move.map(MoveEntry::from),
    }
}

/// Get current timestamp in milliseconds
pub(crate) fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
