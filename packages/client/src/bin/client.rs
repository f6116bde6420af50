//! Terminal chat client for the Mchat relay.
//!
//! Connects with a token, sends each line typed on stdin and prints every
//! relayed message. Reconnects on disconnection (max 5 attempts, 5 seconds
//! apart) but exits at once if the server rejects the token.
//!
//! Run with:
//! ```not_rust
//! MCHAT_TOKEN=<jwt> cargo run --bin mchat-client -- --username alice
//! cargo run --bin mchat-client -- --url ws://127.0.0.1:3000/ws --token <jwt>
//! ```

use clap::Parser;

use mchat_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "mchat-client")]
#[command(about = "Terminal client for the Mchat chat relay", long_about = None)]
struct Args {
    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// Token presented to the server
    #[arg(short = 't', long, env = "MCHAT_TOKEN", hide_env_values = true)]
    token: String,

    /// Username carried by the token; only used for the prompt
    #[arg(short = 'n', long)]
    username: Option<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = mchat_client::run_client(args.url, args.token, args.username).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
