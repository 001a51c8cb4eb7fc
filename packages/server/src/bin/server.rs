//! Studyhall group chat server.
//!
//! Serves the message persistence API and fans stored messages and typing signals
//! out to every WebSocket session joined to a room.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin studyhall-server
//! cargo run --bin studyhall-server -- --host 0.0.0.0 --port 3000
//! ```

use std::sync::Arc;

use clap::Parser;
use studyhall_server::{
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        repository::{InMemoryMembershipRegistry, InMemoryMessageRepository},
    },
    ui::{AppState, Server},
};
use studyhall_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "studyhall-server")]
#[command(about = "Group chat server with room pub/sub and typing relay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repository / MembershipRegistry
    // 2. MessagePusher
    // 3. AppState (UseCases)
    // 4. Server
    let repository = Arc::new(InMemoryMessageRepository::new());
    let registry = Arc::new(InMemoryMembershipRegistry::new());
    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let state = AppState::new(repository, registry, message_pusher, Arc::new(SystemClock));

    let server = Server::new(state);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
