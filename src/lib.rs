//! Gomoku terminal (workspace facade crate).
//!
//! Re-exports the `gomoku_term::{core,adapter,types}` API while the implementation
//! lives in dedicated crates under `crates/`. The facade itself only carries the
//! pieces the binary needs: logger setup and the terminal client.

pub use gomoku_adapter as adapter;
pub use gomoku_core as core;
pub use gomoku_types as types;

pub mod client;
pub mod logging;
