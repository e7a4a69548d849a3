//! # Chat demo
//!
//! Type lines to send them, `/quit` to leave.
//!
//! ## Against the built-in mock server
//!
//! ```sh
//! cargo run --example mock_chat mock
//! ```
//!
//! ## Against a TCP chat server
//!
//! ```sh
//! cargo run --example mock_chat tcp --host 127.0.0.1 --port 8080
//! ```

use anyhow::Result;
use chat_client_core::{
    ChatConfig, ChatEvent, ChatSession, DeliveryStatus, MockOptions, MockTransport, TcpTransport,
    Transport,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

// --- CLI Setup ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Chat with the in-process mock server
    Mock {
        /// Have another user chime in after connecting
        #[arg(long)]
        visitor: bool,
    },
    /// Chat over TCP
    Tcp {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => ChatConfig::load(path).await?,
        None => ChatConfig::default(),
    };

    match cli.command {
        Commands::Mock { visitor } => {
            let (session, events) =
                ChatSession::start(MockTransport::new(MockOptions::default()), config)?;
            session.connect().await?;
            if visitor {
                session
                    .transport()
                    .simulate_incoming_message("user_visitor", "Visitor", "hey, anyone here?");
            }
            run(session, events).await
        }
        Commands::Tcp { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            let transport = TcpTransport::from_config(&config);
            let (session, events) = ChatSession::start(transport, config)?;
            session.connect().await?;
            run(session, events).await
        }
    }
}

async fn run<T: Transport>(
    mut session: ChatSession<T>,
    mut events: mpsc::UnboundedReceiver<ChatEvent>,
) -> Result<()> {
    println!("You are {}. Type a message, or /quit.", session.user_id());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            // Handle user input
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim();
                if line == "/quit" {
                    break;
                }
                if session.send_message(line).await?.is_none() && !line.is_empty() {
                    eprintln!("Not connected ({}), message dropped.", session.connection_state());
                }
            }

            // Handle chat events
            Some(event) = events.recv() => {
                match event {
                    ChatEvent::NetworkStateChanged { state, message } => {
                        println!("[{state}] {message}");
                    }
                    ChatEvent::MessageReceived(msg) => {
                        let from = if msg.is_own { "You".to_string() } else { msg.sender_name };
                        println!("{from}: {}", msg.content);
                    }
                    ChatEvent::MessageSent { message_id, success: true, .. } => {
                        let status = session
                            .with_log(|log| log.get(&message_id).map(|m| m.status))
                            .unwrap_or(DeliveryStatus::Sent);
                        println!("  ({status:?})");
                    }
                    ChatEvent::MessageSent { error, .. } => {
                        eprintln!("  (failed: {})", error.unwrap_or_else(|| "unknown error".into()));
                    }
                    ChatEvent::UserJoined(user) => println!("* {} joined", user.user_name),
                    ChatEvent::UserLeft(user) => println!("* {} left", user.user_name),
                }
            }
            else => break, // events channel closed
        }
    }

    session.disconnect().await?;
    session.dispose();
    Ok(())
}
