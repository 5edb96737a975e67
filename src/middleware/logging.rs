//! Logging middleware
//!
//! Provides connection lifecycle logging.

use log::info;

use crate::client::ClientId;

/// Log a client connection
pub fn log_connection(client_id: &ClientId, peer: &str, total: usize) {
    info!(
        "Client {} connected from {}. Total clients: {}",
        client_id, peer, total
    );
}

/// Log a chosen username
pub fn log_username(client_id: &ClientId, username: &str) {
    info!("Client {} is now known as {:?}", client_id, username);
}

/// Log a chat message before it is broadcast
pub fn log_chat(client_id: &ClientId, message: &str) {
    info!("Broadcasting from {}: {}", client_id, message);
}

/// Log a client disconnection
pub fn log_disconnection(client_id: &ClientId, total: usize) {
    info!("Client {} disconnected. Total clients: {}", client_id, total);
}
