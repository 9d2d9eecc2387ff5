//! Line-oriented terminal client.
//!
//! Connects to a running server, performs the handshake and then forwards every
//! stdin line as a `command`. Server `output` is printed verbatim; `clear` wipes
//! the terminal.

use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Result};
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use tracing::{debug, info};

use crate::adapter::protocol::{create_command, create_hello};

const CLIENT_NAME: &str = "gomoku-term";

/// How long to keep printing server output after stdin closes
pub const DRAIN_IDLE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectConfig {
    pub host: String,
    pub port: u16,
    /// Join automatically under this name once the handshake completes
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Welcome { client_id: u64 },
    Output(String),
    Clear,
    Error(String),
    /// A line typed by the local user
    Input(String),
    InputClosed,
    Closed,
}

/// Writes protocol lines with a strictly increasing `seq`
pub struct CommandWriter {
    stream: TcpStream,
    seq: u64,
}

impl CommandWriter {
    fn new(stream: TcpStream) -> Self {
        Self { stream, seq: 0 }
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn write_line<T: serde::Serialize>(&mut self, msg: &T) -> Result<()> {
        let line = serde_json::to_string(msg)?;
        self.stream.write_all(line.as_bytes())?;
        self.stream.write_all(b"\n")?;
        self.stream.flush()?;
        Ok(())
    }

    pub fn hello(&mut self) -> Result<()> {
        let seq = self.next_seq();
        self.write_line(&create_hello(seq, CLIENT_NAME, false))
    }

    pub fn command(&mut self, text: &str) -> Result<()> {
        let seq = self.next_seq();
        debug!(seq, command = text, "send command");
        self.write_line(&create_command(seq, text))
    }
}

/// Open the connection and start the socket reader thread.
///
/// Server events arrive on the returned receiver; the sender half is handed back
/// so other producers (stdin) can share the same queue.
pub fn connect(
    config: &ConnectConfig,
) -> Result<(
    CommandWriter,
    mpsc::Sender<ClientEvent>,
    mpsc::Receiver<ClientEvent>,
)> {
    let stream = TcpStream::connect((config.host.as_str(), config.port))
        .map_err(|e| anyhow!("connect {}:{} failed: {}", config.host, config.port, e))?;
    stream
        .set_nodelay(true)
        .map_err(|e| anyhow!("set_nodelay failed: {}", e))?;
    let read_half = stream.try_clone()?;

    let mut writer = CommandWriter::new(stream);
    writer.hello()?;

    let (tx, rx) = mpsc::channel::<ClientEvent>();
    let reader_tx = tx.clone();
    thread::spawn(move || {
        let reader = BufReader::new(read_half);
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    let _ = reader_tx.send(ClientEvent::Error(format!("read error: {}", e)));
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            if let Some(event) = parse_server_line(&line) {
                let _ = reader_tx.send(event);
            }
        }
        let _ = reader_tx.send(ClientEvent::Closed);
    });

    Ok((writer, tx, rx))
}

fn spawn_stdin_reader(tx: mpsc::Sender<ClientEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(ClientEvent::Input(line)).is_err() {
                        return;
                    }
                }
                Err(_) => break,
            }
        }
        let _ = tx.send(ClientEvent::InputClosed);
    });
}

/// Run an interactive session until either side closes
pub fn run_client(config: &ConnectConfig) -> Result<()> {
    let (mut writer, tx, rx) = connect(config)?;
    info!(host = %config.host, port = config.port, "connected");
    spawn_stdin_reader(tx);

    let mut stdout = io::stdout();
    run_session(
        &rx,
        &mut writer,
        &mut stdout,
        config.name.as_deref(),
        DRAIN_IDLE,
    )
}

/// Pump events until the server closes.
///
/// Once local input ends, replies still in flight are printed until the server
/// closes or stays quiet for `drain_idle`.
pub fn run_session<W: Write>(
    rx: &mpsc::Receiver<ClientEvent>,
    writer: &mut CommandWriter,
    out: &mut W,
    name: Option<&str>,
    drain_idle: Duration,
) -> Result<()> {
    let mut input_open = true;
    loop {
        let event = if input_open {
            match rx.recv() {
                Ok(event) => event,
                Err(_) => break,
            }
        } else {
            match rx.recv_timeout(drain_idle) {
                Ok(event) => event,
                Err(_) => break,
            }
        };

        match event {
            ClientEvent::Welcome { client_id } => {
                info!(client_id, "handshake complete");
                if let Some(name) = name {
                    writer.command(&format!("@j {}", name))?;
                }
            }
            ClientEvent::Output(text) => {
                writeln!(out, "{}", text)?;
                out.flush()?;
            }
            ClientEvent::Clear => {
                execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
            }
            ClientEvent::Error(msg) => eprintln!("error: {}", msg),
            ClientEvent::Input(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    writer.command(line)?;
                }
            }
            ClientEvent::InputClosed => {
                debug!("stdin closed, draining server output");
                input_open = false;
            }
            ClientEvent::Closed => break,
        }
    }

    Ok(())
}

fn parse_server_line(line: &str) -> Option<ClientEvent> {
    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return Some(ClientEvent::Error(format!("invalid json: {}", e))),
    };
    let msg_type = value.get("type").and_then(|v| v.as_str()).unwrap_or("");
    match msg_type {
        "welcome" => Some(ClientEvent::Welcome {
            client_id: value.get("client_id").and_then(|v| v.as_u64()).unwrap_or(0),
        }),
        "output" => {
            let data = value.get("data").and_then(|v| v.as_str()).unwrap_or("");
            Some(ClientEvent::Output(data.to_string()))
        }
        "clear" => Some(ClientEvent::Clear),
        "error" => {
            let code = value.get("code").and_then(|v| v.as_str()).unwrap_or("unknown");
            let msg = value.get("message").and_then(|v| v.as_str()).unwrap_or("");
            Some(ClientEvent::Error(format!("{} {}", code, msg)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_server_line_reads_output_and_clear() {
        assert_eq!(
            parse_server_line(r#"{"type":"output","seq":3,"ts":1,"data":"Alice joined the game!"}"#),
            Some(ClientEvent::Output("Alice joined the game!".to_string()))
        );
        assert_eq!(
            parse_server_line(r#"{"type":"clear","seq":4,"ts":1}"#),
            Some(ClientEvent::Clear)
        );
    }

    #[test]
    fn parse_server_line_reads_welcome_client_id() {
        let line = r#"{"type":"welcome","seq":1,"ts":1,"protocol_version":"1.0.0","client_id":7,"game_id":"gomoku-term"}"#;
        assert_eq!(
            parse_server_line(line),
            Some(ClientEvent::Welcome { client_id: 7 })
        );
    }

    #[test]
    fn parse_server_line_formats_errors() {
        let line = r#"{"type":"error","seq":2,"ts":1,"code":"backpressure","message":"Command queue is full"}"#;
        assert_eq!(
            parse_server_line(line),
            Some(ClientEvent::Error("backpressure Command queue is full".to_string()))
        );
        assert!(matches!(
            parse_server_line("{not json"),
            Some(ClientEvent::Error(_))
        ));
    }

    fn writer_pair() -> (CommandWriter, BufReader<TcpStream>) {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server_side, _) = listener.accept().unwrap();
        (CommandWriter::new(client), BufReader::new(server_side))
    }

    #[test]
    fn session_prints_replies_that_arrive_after_stdin_closes() {
        let (mut writer, mut server_side) = writer_pair();
        let (tx, rx) = mpsc::channel();
        tx.send(ClientEvent::Input("@l".to_string())).unwrap();
        tx.send(ClientEvent::InputClosed).unwrap();
        tx.send(ClientEvent::Output("Alice(●)".to_string())).unwrap();
        tx.send(ClientEvent::Closed).unwrap();
        tx.send(ClientEvent::Output("never read".to_string())).unwrap();

        let mut out = Vec::new();
        run_session(&rx, &mut writer, &mut out, None, Duration::from_secs(5)).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Alice(●)\n");

        let mut line = String::new();
        server_side.read_line(&mut line).unwrap();
        let sent: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(sent["type"], "command");
        assert_eq!(sent["command"], "@l");
    }

    #[test]
    fn session_stops_draining_when_server_goes_quiet() {
        let (mut writer, _server_side) = writer_pair();
        let (tx, rx) = mpsc::channel();
        tx.send(ClientEvent::InputClosed).unwrap();

        let mut out = Vec::new();
        run_session(&rx, &mut writer, &mut out, None, Duration::from_millis(50)).unwrap();
        assert!(out.is_empty());
        drop(tx);
    }

    #[test]
    fn parse_server_line_ignores_state_messages() {
        let line = r#"{"type":"state","seq":9,"ts":1}"#;
        assert_eq!(parse_server_line(line), None);
    }
}
