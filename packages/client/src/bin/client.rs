//! Terminal group chat client.
//!
//! Connects to a Studyhall chat server, joins the given rooms and sends what
//! you type to the current room. Other members see you typing while you edit
//! a line. Reconnects automatically (up to 10 attempts with exponential
//! backoff) and restores joined rooms afterwards.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin studyhall-client -- -u alice -n Alice -r math
//! cargo run --bin studyhall-client -- -u bob -n Bob -s http://127.0.0.1:8080 -r math -r physics
//! ```

use std::time::Duration;

use clap::Parser;

use studyhall_client::{ClientConfig, terminal::run_client};
use studyhall_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "studyhall-client")]
#[command(about = "Group chat client with typing indicators", long_about = None)]
struct Args {
    /// User ID sent with every message
    #[arg(short = 'u', long)]
    user_id: String,

    /// Display name shown to other members
    #[arg(short = 'n', long)]
    user_name: String,

    /// Chat server base URL
    #[arg(short = 's', long, default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Room to join on startup (repeatable; the last one becomes current)
    #[arg(short = 'r', long = "room")]
    rooms: Vec<String>,

    /// Timeout for persistence requests, in seconds
    #[arg(long, default_value_t = 15)]
    request_timeout: u64,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let mut config = ClientConfig::new(args.server, args.user_id, args.user_name);
    config.request_timeout = Duration::from_secs(args.request_timeout);

    // Run the client
    if let Err(e) = run_client(config, args.rooms).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
