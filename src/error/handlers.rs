//! Error handlers
//!
//! Logs errors at a level that matches how serious they are.

use crate::client::ClientId;
use crate::error::types::{ChatServerError, SessionError};
use log::{error, info, warn};
use std::io;

/// Handle a chat server error
pub fn handle_error(err: &ChatServerError) {
    match err {
        ChatServerError::Session(SessionError::Io(e)) | ChatServerError::IoError(e)
            if is_disconnect(e) =>
        {
            info!("Peer went away: {}", err);
        }
        ChatServerError::Session(_) | ChatServerError::Registry(_) => warn!("{}", err),
        _ => error!("Chat Server Error: {}", err),
    }
}

/// Whether an I/O error just means the other side is gone.
pub fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::NotConnected
    )
}

/// Log a failed read on a client's stream.
pub fn log_stream_error(client_id: &ClientId, err: &io::Error) {
    if is_disconnect(err) {
        info!("Client {} dropped the connection: {}", client_id, err);
    } else {
        error!("Failed to read from {}: {}", client_id, err);
    }
}
