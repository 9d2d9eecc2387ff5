//! Adapter module - terminal clients over a TCP socket with a JSON protocol
//!
//! This module lets remote terminal clients play a Gomoku match. Each client
//! types text commands; the server forwards them to a single game loop that owns
//! the match, and the resulting text is sent back to the sender or broadcast.
//!
//! # Protocol Overview
//!
//! The adapter implements a **line-delimited JSON protocol** over TCP:
//!
//! 1. **Connection**: Client connects to TCP socket (default: 127.0.0.1:5000)
//! 2. **Handshake**: Client sends `hello`, server responds with `welcome` and a greeting
//! 3. **Commanding**: Client sends `command` messages carrying the typed text
//! 4. **Output**: Server sends `output` lines (to one client or all), `clear`, and
//!    optionally structured `state` snapshots
//!
//! # Commands
//!
//! | text | effect |
//! |------|--------|
//! | `@j <name>` | take a seat |
//! | `@s` | start (or restart) the match |
//! | `@p <row> <col>` | place a stone |
//! | `@b` | show the board |
//! | `@l` | list players |
//! | `@m` | move history |
//! | `@c` | clear the terminal |
//! | `@h` | help |
//!
//! # Environment Variables
//!
//! - `GOMOKU_HOST`: Bind address (default: "127.0.0.1")
//! - `GOMOKU_PORT`: Port number (default: 5000)
//! - `GOMOKU_MAX_PENDING`: Inbound command queue size (default: 16)
//! - `GOMOKU_LOG_PATH`: Append raw protocol lines to this file
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":1234567890,"client":{"name":"term","version":"0.1.0"},"protocol_version":"1.0.0","requested":{"stream_state":false}}
//! Server -> Client: {"type":"welcome","seq":1,"ts":1234567890,"protocol_version":"1.0.0","client_id":1,"game_id":"gomoku-term"}
//! Client -> Server: {"type":"command","seq":2,"ts":1234567891,"command":"@j alice"}
//! Server -> Client: {"type":"output","seq":1,"ts":1234567891,"data":"alice joined the game!"}
//! ```
//!
//! # Testing
//!
//! Connect to the server using netcat for manual testing:
//!
//! ```bash
//! nc 127.0.0.1 5000
//! {"type":"hello","seq":1,"ts":0,"client":{"name":"nc","version":"0"},"protocol_version":"1.0.0"}
//! ```

pub mod command;
pub mod dispatcher;
pub mod protocol;
pub mod runtime;
pub mod server;

pub use gomoku_core as core;
pub use gomoku_types as types;

// Re-export protocol types for convenience
pub use command::{parse_command, Command, CommandError};
pub use dispatcher::{Delivery, Dispatcher};
pub use protocol::*;
pub use runtime::{serve, GameLoop, InboundCommand, InboundPayload, OutboundMessage};
pub use server::*;
