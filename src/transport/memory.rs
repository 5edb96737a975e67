//! In-memory transport
//!
//! Connects clients to a server through `tokio::io::duplex` pipes. Used by
//! tests and by anything embedding the relay without a socket.

use std::io;
use tokio::io::DuplexStream;
use tokio::sync::mpsc;

use crate::transport::{Acceptor, Session};

const PIPE_CAPACITY: usize = 64 * 1024;

/// Creates a connected listener/connector pair.
pub fn listener(backlog: usize) -> (MemoryConnector, MemoryListener) {
    let (tx, rx) = mpsc::channel(backlog);
    (
        MemoryConnector { incoming: tx },
        MemoryListener { incoming: rx },
    )
}

/// Client side: opens new sessions. Dropping every connector closes the
/// listener.
#[derive(Clone)]
pub struct MemoryConnector {
    incoming: mpsc::Sender<io::Result<Session<DuplexStream>>>,
}

impl MemoryConnector {
    /// Opens a session and returns the client's end of the stream.
    pub async fn connect(&self, peer: impl Into<String>) -> io::Result<DuplexStream> {
        self.connect_with_capacity(peer, PIPE_CAPACITY).await
    }

    /// Like `connect`, but each direction buffers at most `capacity` bytes
    /// before writes wait for the other side to read.
    pub async fn connect_with_capacity(
        &self,
        peer: impl Into<String>,
        capacity: usize,
    ) -> io::Result<DuplexStream> {
        let (client_end, server_end) = tokio::io::duplex(capacity);
        self.incoming
            .send(Ok(Session {
                peer: peer.into(),
                stream: server_end,
            }))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::ConnectionRefused, "listener closed"))?;
        Ok(client_end)
    }

    /// Makes the listener's next accept fail with `error`.
    pub async fn fail_next_accept(&self, error: io::Error) -> io::Result<()> {
        self.incoming
            .send(Err(error))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::ConnectionRefused, "listener closed"))
    }
}

/// Server side of the in-memory transport.
pub struct MemoryListener {
    incoming: mpsc::Receiver<io::Result<Session<DuplexStream>>>,
}

impl Acceptor for MemoryListener {
    type Stream = DuplexStream;

    async fn next_session(&mut self) -> io::Result<Option<Session<DuplexStream>>> {
        match self.incoming.recv().await {
            Some(Ok(session)) => Ok(Some(session)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }
}
