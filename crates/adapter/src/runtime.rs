//! Adapter runtime integration.
//!
//! Bridges the single game loop that owns the match with the async TCP server.
//! Commands from all clients funnel through one bounded queue, so the match sees
//! exactly one caller at a time.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::core::Match;
use crate::dispatcher::{Delivery, Dispatcher};
use crate::protocol::{create_clear, create_output, create_state, ServerMessage, StateMessage};
use crate::server::{run_server, ServerConfig};
use crate::types::ClientId;

/// Command delivered to the game loop.
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: ClientId,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPayload {
    /// Raw text command typed by the player
    Line(String),
    /// Client asked for the structured state right after its handshake
    SnapshotRequest,
    /// Connection closed
    Disconnected,
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClient {
        client_id: ClientId,
        message: ServerMessage,
    },
    Broadcast {
        message: ServerMessage,
    },
    /// Only reaches clients that asked for `stream_state`
    BroadcastState {
        state: StateMessage,
    },
}

/// Owns the dispatcher and stamps outbound messages with a server-wide seq
#[derive(Debug, Default)]
pub struct GameLoop {
    dispatcher: Dispatcher,
    seq: u64,
}

impl GameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn game(&self) -> &Match {
        self.dispatcher.game()
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Apply one inbound command and collect what must be sent
    pub fn apply(&mut self, cmd: InboundCommand) -> Vec<OutboundMessage> {
        let deliveries = match cmd.payload {
            InboundPayload::Line(line) => self.dispatcher.handle_line(cmd.client_id, &line),
            InboundPayload::Disconnected => self.dispatcher.disconnect(cmd.client_id),
            InboundPayload::SnapshotRequest => {
                let seq = self.next_seq();
                let state = create_state(seq, &self.game().snapshot());
                return vec![OutboundMessage::ToClient {
                    client_id: cmd.client_id,
                    message: ServerMessage::State(state),
                }];
            }
        };

        deliveries
            .into_iter()
            .map(|delivery| {
                let seq = self.next_seq();
                match delivery {
                    Delivery::ToClient { client_id, text } => OutboundMessage::ToClient {
                        client_id,
                        message: ServerMessage::Output(create_output(seq, &text)),
                    },
                    Delivery::Broadcast { text } => OutboundMessage::Broadcast {
                        message: ServerMessage::Output(create_output(seq, &text)),
                    },
                    Delivery::Clear { client_id } => OutboundMessage::ToClient {
                        client_id,
                        message: ServerMessage::Clear(create_clear(seq)),
                    },
                    Delivery::State => OutboundMessage::BroadcastState {
                        state: create_state(seq, &self.dispatcher.game().snapshot()),
                    },
                }
            })
            .collect()
    }
}

/// Drain the command queue until every sender is gone
pub async fn run_game_loop(
    mut game_loop: GameLoop,
    mut cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
) -> GameLoop {
    while let Some(cmd) = cmd_rx.recv().await {
        debug!(client = %cmd.client_id, seq = cmd.seq, "apply command");
        for msg in game_loop.apply(cmd) {
            if out_tx.send(msg).is_err() {
                return game_loop;
            }
        }
    }
    game_loop
}

/// Run the server and its game loop until the server stops.
pub async fn serve(
    config: ServerConfig,
    ready_tx: Option<oneshot::Sender<std::net::SocketAddr>>,
) -> anyhow::Result<()> {
    let max_pending = config.max_pending_commands.max(1);
    let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();

    info!(max_pending, "starting game loop");
    let game = tokio::spawn(run_game_loop(GameLoop::new(), cmd_rx, out_tx));

    let result = run_server(config, cmd_tx, out_rx, ready_tx).await;
    game.abort();
    result
}
