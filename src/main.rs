//! Gomoku terminal runner (default binary).
//!
//! `serve` hosts the match over TCP; `connect` is the line client players type
//! into. Environment variables configure the server, flags override them.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use gomoku_term::adapter::{serve, ServerConfig};
use gomoku_term::client::{run_client, ConnectConfig};
use gomoku_term::logging::init_logger;

#[derive(Debug, Parser)]
#[command(name = "gomoku-term")]
#[command(about = "Two-player Gomoku over a terminal line protocol")]
struct Cli {
    #[arg(long, global = true, help = "Enable verbose output")]
    verbose: bool,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Host a match
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        #[arg(long, help = "Inbound command queue size")]
        max_pending: Option<usize>,
        #[arg(long, help = "Append raw protocol lines to this file")]
        log_path: Option<String>,
    },
    /// Join a running server as a player
    Connect {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 5000)]
        port: u16,
        #[arg(long, help = "Join the match under this name right away")]
        name: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Mode::Serve {
            host,
            port,
            max_pending,
            log_path,
        } => {
            let mut config = ServerConfig::from_env();
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(max_pending) = max_pending {
                config.max_pending_commands = max_pending;
            }
            if log_path.is_some() {
                config.log_path = log_path;
            }

            info!(host = %config.host, port = config.port, "starting gomoku server");
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(serve(config, None))
        }
        Mode::Connect { host, port, name } => run_client(&ConnectConfig { host, port, name }),
    }
}
