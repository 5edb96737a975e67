use log::{error, info};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;

use crate::client::{ClientRegistry, SessionSettings, handle_session};
use crate::error::ChatServerError;
use crate::server::config::ServerConfig;
use crate::transport::Acceptor;

/// Pause after a failed accept, so a listener stuck in an error state does
/// not spin.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub struct Server<A> {
    acceptor: A,
    registry: Arc<ClientRegistry>,
    settings: Arc<SessionSettings>,
}

impl Server<TcpListener> {
    /// Binds a TCP listener on the configured address.
    pub async fn bind(config: &ServerConfig) -> Result<Self, ChatServerError> {
        let address = config.listen_address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            error!("Failed to bind to {}: {}", address, e);
            ChatServerError::NetworkError(format!("failed to bind {}: {}", address, e))
        })?;

        info!("Server bound to {}", address);
        Ok(Self::with_acceptor(listener, config))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.acceptor.local_addr()
    }
}

impl<A: Acceptor> Server<A> {
    pub fn with_acceptor(acceptor: A, config: &ServerConfig) -> Self {
        Self::with_registry(
            acceptor,
            Arc::new(ClientRegistry::from_config(config)),
            SessionSettings::from(config),
        )
    }

    pub fn with_registry(
        acceptor: A,
        registry: Arc<ClientRegistry>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            acceptor,
            registry,
            settings: Arc::new(settings),
        }
    }

    /// Shared handle to the registry, e.g. for reporting or tests.
    pub fn registry(&self) -> Arc<ClientRegistry> {
        Arc::clone(&self.registry)
    }

    /// Accepts sessions until the listener closes.
    ///
    /// Each session gets its own task so the accept loop never waits on a
    /// client. A failed accept is logged and the loop keeps going after
    /// `ACCEPT_BACKOFF`.
    pub async fn run(mut self) {
        info!("Starting chat relay accept loop");

        loop {
            match self.acceptor.next_session().await {
                Ok(Some(session)) => {
                    let registry = Arc::clone(&self.registry);
                    let settings = Arc::clone(&self.settings);

                    tokio::spawn(handle_session(
                        session.stream,
                        session.peer,
                        registry,
                        settings,
                    ));
                }
                Ok(None) => {
                    info!("Listener closed, accept loop stopping");
                    break;
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}
