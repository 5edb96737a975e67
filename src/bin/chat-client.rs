//! Chat Relay Client - Entry Point
//!
//! Connects to a chat relay and bridges it to the terminal. The first line
//! typed is the username; `/quit` or `/exit` leaves.

use chat_relay::console::{ClientConfig, run_console};
use chat_relay::utils::logging::setup_logging;
use log::{error, info};
use tokio::io::BufReader;
use tokio::net::TcpStream;

#[tokio::main]
async fn main() {
    setup_logging();

    let config = match ClientConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let stream = match TcpStream::connect(&config.server_address).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to connect to {}: {}", config.server_address, e);
            std::process::exit(1);
        }
    };
    info!("Connected to {}", config.server_address);

    let stdin = BufReader::new(tokio::io::stdin());
    if let Err(e) = run_console(stream, stdin, tokio::io::stdout()).await {
        error!("Connection error: {}", e);
        std::process::exit(1);
    }
}
