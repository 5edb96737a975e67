//! Transport abstraction
//!
//! The relay only needs one ordered, reliable, bidirectional byte stream per
//! connecting client. `Acceptor` hands those out; how they were set up (plain
//! TCP, TLS, an in-memory pipe) is not the relay's concern.

pub mod memory;

use std::future::Future;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

pub use memory::{MemoryConnector, MemoryListener};

/// One accepted connection.
pub struct Session<S> {
    /// Peer label for logs, e.g. a socket address.
    pub peer: String,
    pub stream: S,
}

/// Source of incoming sessions.
pub trait Acceptor: Send {
    type Stream: AsyncRead + AsyncWrite + Send + Unpin + 'static;

    /// Waits for the next session.
    ///
    /// `Ok(None)` means the listener is closed and no session will follow.
    /// An `Err` is a failed accept; later calls may still succeed.
    fn next_session(
        &mut self,
    ) -> impl Future<Output = io::Result<Option<Session<Self::Stream>>>> + Send;
}

impl Acceptor for TcpListener {
    type Stream = TcpStream;

    async fn next_session(&mut self) -> io::Result<Option<Session<TcpStream>>> {
        let (stream, addr) = self.accept().await?;
        Ok(Some(Session {
            peer: addr.to_string(),
            stream,
        }))
    }
}
