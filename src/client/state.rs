//! Module `state`
//!
//! Defines the `ClientRecord` struct and associated types that track one
//! connected chat client: its id, whether it has picked a username yet, and
//! the write half of its stream.

use log::debug;
use std::fmt;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;

use crate::error::SessionError;

/// Write half of a client's stream, owned by exactly one `ClientRecord`.
pub type Outbound = Box<dyn AsyncWrite + Send + Unpin>;

/// Server-assigned identifier of the form `client-<n>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    pub fn from_sequence(n: u64) -> Self {
        Self(format!("client-{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a client is in its session.
///
/// An empty username is still a username: once the first line arrives the
/// client is `Chatting`, whatever that line contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientState {
    AwaitingUsername,
    Chatting { username: String },
}

/// Represents one connected chat client.
pub struct ClientRecord {
    id: ClientId,
    peer: String,
    state: RwLock<ClientState>,
    outbound: Mutex<Outbound>,
}

impl ClientRecord {
    pub fn new<W>(id: ClientId, peer: impl Into<String>, outbound: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            id,
            peer: peer.into(),
            state: RwLock::new(ClientState::AwaitingUsername),
            outbound: Mutex::new(Box::new(outbound)),
        }
    }

    // --------------------
    // Getter methods
    // --------------------

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    /// Transport-level peer label, only used for logging.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub async fn state(&self) -> ClientState {
        self.state.read().await.clone()
    }

    /// Returns the username if the client has sent one.
    pub async fn username(&self) -> Option<String> {
        match &*self.state.read().await {
            ClientState::AwaitingUsername => None,
            ClientState::Chatting { username } => Some(username.clone()),
        }
    }

    // --------------------
    // Setter methods
    // --------------------

    /// Moves the client from `AwaitingUsername` to `Chatting`.
    ///
    /// The username is fixed for the life of the connection, so a second call
    /// fails and leaves the first name in place.
    pub async fn set_username(&self, username: String) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        if let ClientState::Chatting { .. } = *state {
            return Err(SessionError::UsernameAlreadySet(self.id.clone()));
        }
        *state = ClientState::Chatting { username };
        Ok(())
    }

    // --------------------
    // Stream methods
    // --------------------

    /// Writes `line` plus a newline terminator to this client's stream.
    ///
    /// The whole write, including waiting for the stream, is bounded by
    /// `write_timeout` when one is given.
    pub async fn send_line(&self, line: &str, write_timeout: Option<Duration>) -> io::Result<()> {
        let mut payload = String::with_capacity(line.len() + 1);
        payload.push_str(line);
        payload.push('\n');

        let write = async {
            let mut outbound = self.outbound.lock().await;
            outbound.write_all(payload.as_bytes()).await?;
            outbound.flush().await
        };

        match write_timeout {
            Some(limit) => match timeout(limit, write).await {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("write to {} timed out after {:?}", self.id, limit),
                )),
            },
            None => write.await,
        }
    }

    /// Shuts down the write half so the peer sees end-of-stream.
    pub async fn close(&self) {
        let mut outbound = self.outbound.lock().await;
        if let Err(e) = outbound.shutdown().await {
            debug!("Shutdown of {} failed: {}", self.id, e);
        }
    }
}
