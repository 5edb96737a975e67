//! Chat Relay Server - Entry Point
//!
//! Accepts line-based chat clients and relays each client's messages to
//! everyone else who is connected.

use chat_relay::error::ChatServerError;
use chat_relay::error::handlers::handle_error;
use chat_relay::utils::logging::setup_logging;
use chat_relay::{Server, ServerConfig};
use log::{error, info, warn};

#[tokio::main]
async fn main() {
    setup_logging();

    info!("Launching chat relay...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            handle_error(&ChatServerError::from(e));
            std::process::exit(1);
        }
    };

    let server = match Server::bind(&config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Server startup failed: {}", e);
            std::process::exit(1);
        }
    };

    println!("Chat relay listening on {} ...", config.listen_address());

    tokio::select! {
        _ = server.run() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Failed to listen for ctrl-c: {}", e);
            }
            info!("Shutting down");
        }
    }
}
