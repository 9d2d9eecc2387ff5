//! TCP server for terminal clients
//!
//! Handles incoming connections and manages client lifecycle.
//! Uses tokio for async networking. The server never touches the match: it
//! forwards commands to the game loop and fans out whatever the loop sends back.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info, warn};

use crate::dispatcher::GREETING;
use crate::protocol::*;
use crate::runtime::{InboundCommand, InboundPayload, OutboundMessage};
use crate::types::ClientId;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub max_pending_commands: usize,
    pub log_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            protocol_version: PROTOCOL_VERSION.to_string(),
            max_pending_commands: 16,
            log_path: None,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();

        let host = env::var("GOMOKU_HOST").unwrap_or(defaults.host);
        let port = env::var("GOMOKU_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let max_pending_commands = env::var("GOMOKU_MAX_PENDING")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_pending_commands);

        let log_path = env::var("GOMOKU_LOG_PATH")
            .ok()
            .map(|s| s.trim().to_string())
            .and_then(|s| if s.is_empty() { None } else { Some(s) });

        Self {
            host,
            port,
            protocol_version: defaults.protocol_version,
            max_pending_commands,
            log_path,
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid socket address {}:{}", self.host, self.port))
    }
}

/// Shared server state
pub struct ServerState {
    config: ServerConfig,
    clients: RwLock<Vec<ClientHandle>>,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            clients: RwLock::new(Vec::new()),
        }
    }

    async fn is_handshaken(&self, client_id: ClientId) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .map(|c| c.handshaken)
            .unwrap_or(false)
    }

    /// Enforce strictly increasing `seq` per client
    async fn check_and_update_seq(&self, client_id: ClientId, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return true;
        };

        match client.last_seq {
            Some(prev) if seq <= prev => false,
            _ => {
                client.last_seq = Some(seq);
                true
            }
        }
    }

    async fn send_to(&self, client_id: ClientId, msg: ServerMessage) {
        let clients = self.clients.read().await;
        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
            let _ = c.tx.send(msg);
        }
    }
}

/// Handle to a connected client
pub struct ClientHandle {
    pub id: ClientId,
    pub stream_state: bool,
    pub handshaken: bool,
    pub last_seq: Option<u64>,
    pub tx: mpsc::UnboundedSender<ServerMessage>, // Channel to send messages to client
}

/// Start the TCP server
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let wire_log_tx = match config.log_path.clone() {
        Some(path) => Some(spawn_wire_log(path).await?),
        None => None,
    };

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    let bound = listener.local_addr()?;
    info!(%bound, "server listening");
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(config));
    let mut client_id_counter = 0u64;

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match msg {
                    OutboundMessage::ToClient { client_id, message } => {
                        state.send_to(client_id, message).await;
                    }
                    OutboundMessage::Broadcast { message } => {
                        let clients = state.clients.read().await;
                        for c in clients.iter().filter(|c| c.handshaken) {
                            let _ = c.tx.send(message.clone());
                        }
                    }
                    OutboundMessage::BroadcastState { state: snapshot } => {
                        let clients = state.clients.read().await;
                        for c in clients.iter().filter(|c| c.handshaken && c.stream_state) {
                            let _ = c.tx.send(ServerMessage::State(snapshot.clone()));
                        }
                    }
                }
            }
        });
    }

    // Accept incoming connections
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = ClientId(client_id_counter);

        info!(client = %client_id, %addr, "client connected");

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();
        let wire_log_tx = wire_log_tx.clone();

        // Spawn task to handle this client
        tokio::spawn(async move {
            let result = handle_client(
                socket,
                client_id,
                Arc::clone(&state),
                command_tx.clone(),
                wire_log_tx,
            )
            .await;
            if let Err(e) = result {
                warn!(client = %client_id, error = %e, "client error");
            }
            disconnect(&state, &command_tx, client_id).await;
            info!(client = %client_id, %addr, "client disconnected");
        });
    }
}

/// Append-only file of every raw line read or written
async fn spawn_wire_log(path: String) -> anyhow::Result<mpsc::UnboundedSender<Vec<u8>>> {
    use tokio::fs::OpenOptions;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .with_context(|| format!("failed to open wire log {}", path))?;

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<u8>>();
    tokio::spawn(async move {
        while let Some(bytes) = rx.recv().await {
            if file.write_all(&bytes).await.is_err() || file.write_all(b"\n").await.is_err() {
                break;
            }
        }
        let _ = file.flush().await;
    });
    Ok(tx)
}

/// Remove the client and tell the game loop its seat (if any) is free
async fn disconnect(
    state: &Arc<ServerState>,
    command_tx: &mpsc::Sender<InboundCommand>,
    client_id: ClientId,
) {
    {
        let mut clients = state.clients.write().await;
        clients.retain(|c| c.id != client_id);
    }
    // Must not be dropped under backpressure, so wait for queue space.
    let _ = command_tx
        .send(InboundCommand {
            client_id,
            seq: 0,
            payload: InboundPayload::Disconnected,
        })
        .await;
}

/// Handle a single client connection
async fn handle_client(
    socket: TcpStream,
    client_id: ClientId,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
    wire_log_tx: Option<mpsc::UnboundedSender<Vec<u8>>>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = tokio::io::split(socket);
    let mut reader = BufReader::new(reader);

    // Channel to send messages to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    {
        let mut clients = state.clients.write().await;
        clients.push(ClientHandle {
            id: client_id,
            stream_state: false,
            handshaken: false,
            last_seq: None,
            tx: tx.clone(),
        });
    }

    let wire_log_tx_out = wire_log_tx.clone();

    // Spawn task to write messages to client
    let write_task = tokio::spawn(async move {
        let mut buf: Vec<u8> = Vec::with_capacity(4096);
        while let Some(msg) = rx.recv().await {
            buf.clear();
            if serde_json::to_writer(&mut buf, &msg).is_err() {
                continue;
            }
            if let Some(tx) = wire_log_tx_out.as_ref() {
                let _ = tx.send(buf.clone());
            }
            buf.push(b'\n');
            if writer.write_all(&buf).await.is_err() {
                break;
            }
            if writer.flush().await.is_err() {
                break;
            }
        }
    });

    let reply_error = |seq: u64, code: ErrorCode, message: &str| {
        let _ = tx.send(ServerMessage::Error(create_error(seq, code, message)));
    };

    // Handle incoming messages
    let mut line: Vec<u8> = Vec::with_capacity(1024);

    loop {
        line.clear();
        let bytes_read = reader.read_until(b'\n', &mut line).await?;

        if bytes_read == 0 {
            // Client disconnected
            break;
        }

        // A bad line is rejected on its own; the connection stays up.
        let raw_line = match std::str::from_utf8(&line) {
            Ok(text) => text.trim_end_matches(|c| c == '\n' || c == '\r'),
            Err(_) => {
                let seq = extract_seq_best_effort(&String::from_utf8_lossy(&line)).unwrap_or(0);
                debug!(client = %client_id, seq, "line is not valid utf-8");
                reply_error(seq, ErrorCode::InvalidCommand, "message is not valid UTF-8");
                continue;
            }
        };
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(tx) = wire_log_tx.as_ref() {
            let _ = tx.send(raw_line.as_bytes().to_vec());
        }

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if state.is_handshaken(client_id).await {
                    if !state.check_and_update_seq(client_id, hello.seq).await {
                        reply_error(hello.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    } else {
                        reply_error(hello.seq, ErrorCode::InvalidCommand, "already handshaken");
                    }
                    continue;
                }

                let expected_major = state.config.protocol_version.split('.').next().unwrap_or("1");
                if hello.protocol_version.split('.').next() != Some(expected_major) {
                    reply_error(
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("Protocol version {} not supported", hello.protocol_version),
                    );
                    break;
                }

                {
                    let mut clients = state.clients.write().await;
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.stream_state = hello.requested.stream_state;
                    }
                }
                info!(client = %client_id, name = %hello.client.name, "handshake complete");

                let _ = tx.send(ServerMessage::Welcome(create_welcome(
                    hello.seq,
                    &state.config.protocol_version,
                    client_id.0,
                )));
                let _ = tx.send(ServerMessage::Output(create_output(hello.seq, GREETING)));

                // The initial state is owed to the client, so wait for queue space.
                if hello.requested.stream_state
                    && command_tx
                        .send(InboundCommand {
                            client_id,
                            seq: hello.seq,
                            payload: InboundPayload::SnapshotRequest,
                        })
                        .await
                        .is_err()
                {
                    warn!(client = %client_id, "game loop gone, initial state not requested");
                }
            }

            Ok(ParsedMessage::Command(cmd)) => {
                if !state.is_handshaken(client_id).await {
                    reply_error(cmd.seq, ErrorCode::HandshakeRequired, "Send hello before command");
                    continue;
                }

                if !state.check_and_update_seq(client_id, cmd.seq).await {
                    reply_error(cmd.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }

                // Backpressure: bounded queue.
                if command_tx
                    .try_send(InboundCommand {
                        client_id,
                        seq: cmd.seq,
                        payload: InboundPayload::Line(cmd.command),
                    })
                    .is_err()
                {
                    warn!(client = %client_id, seq = cmd.seq, "command queue full");
                    reply_error(cmd.seq, ErrorCode::Backpressure, "Command queue is full");
                }
            }

            Ok(ParsedMessage::Unknown(unknown)) => {
                debug!(client = %client_id, seq = unknown.seq, "unknown message type");
                reply_error(unknown.seq, ErrorCode::InvalidCommand, "Unknown message type");
            }

            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                reply_error(seq, ErrorCode::InvalidCommand, &format!("JSON parse error: {}", e));
            }
        }
    }

    // Let the writer drain what is already queued, then stop.
    {
        let mut clients = state.clients.write().await;
        clients.retain(|c| c.id != client_id);
    }
    drop(tx);
    let _ = write_task.await;

    Ok(())
}
