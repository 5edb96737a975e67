//! Client registry
//!
//! Single source of truth for who is connected, and the only way messages
//! reach other clients.

use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinSet;

use crate::client::{ClientId, ClientRecord};
use crate::error::{RegistryError, SessionError};
use crate::server::config::ServerConfig;

/// Outcome of one broadcast, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Registry for tracking connected clients.
///
/// Register and unregister take the write lock. Broadcast, send_to and count
/// take the read lock only long enough to look clients up; no write to a
/// client's stream happens while the lock is held.
pub struct ClientRegistry {
    clients: RwLock<HashMap<ClientId, Arc<ClientRecord>>>,
    next_id: AtomicU64,
    max_clients: Option<usize>,
    write_timeout: Option<Duration>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::with_limits(None, None)
    }

    pub fn with_limits(max_clients: Option<usize>, write_timeout: Option<Duration>) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            max_clients,
            write_timeout,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::with_limits(config.max_clients_limit(), config.write_timeout())
    }

    /// Hands out the next `client-<n>` id. Never repeats within a registry.
    pub fn next_id(&self) -> ClientId {
        ClientId::from_sequence(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout
    }

    pub async fn register(&self, record: Arc<ClientRecord>) -> Result<(), RegistryError> {
        let mut clients = self.clients.write().await;

        if clients.contains_key(record.id()) {
            return Err(RegistryError::DuplicateId(record.id().clone()));
        }

        if let Some(max) = self.max_clients {
            if clients.len() >= max {
                return Err(RegistryError::CapacityReached(max));
            }
        }

        clients.insert(record.id().clone(), record);
        Ok(())
    }

    /// Removes the client if present. Removing an unknown id is a no-op.
    pub async fn unregister(&self, id: &ClientId) -> Option<Arc<ClientRecord>> {
        let mut clients = self.clients.write().await;
        clients.remove(id)
    }

    /// Sends `message` to every registered client except `exclude`.
    ///
    /// Recipients are snapshotted under the read lock and written to after it
    /// is released, each in its own task, so a stalled client only delays its
    /// own delivery. A failed write to one client is logged and skipped; it
    /// never stops delivery to the rest and is never reported to the sender
    /// as an error. Returns once every write has finished or failed.
    pub async fn broadcast(&self, message: &str, exclude: &ClientId) -> BroadcastReport {
        let recipients: Vec<Arc<ClientRecord>> = {
            let clients = self.clients.read().await;
            clients
                .iter()
                .filter(|(id, _)| *id != exclude)
                .map(|(_, client)| Arc::clone(client))
                .collect()
        };

        let message: Arc<str> = Arc::from(message);
        let mut writes = JoinSet::new();
        for client in recipients {
            let message = Arc::clone(&message);
            let write_timeout = self.write_timeout;
            writes.spawn(async move {
                let result = client.send_line(&message, write_timeout).await;
                (client, result)
            });
        }

        let mut report = BroadcastReport::default();
        while let Some(joined) = writes.join_next().await {
            match joined {
                Ok((_, Ok(()))) => report.delivered += 1,
                Ok((client, Err(e))) => {
                    warn!("Failed to deliver to {} ({}): {}", client.id(), client.peer(), e);
                    report.failed += 1;
                }
                Err(e) => {
                    warn!("Delivery task failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        debug!(
            "Broadcast from {}: {} delivered, {} failed",
            exclude, report.delivered, report.failed
        );
        report
    }

    /// Sends a private line to one registered client.
    pub async fn send_to(&self, id: &ClientId, message: &str) -> Result<(), SessionError> {
        let client = {
            let clients = self.clients.read().await;
            clients
                .get(id)
                .cloned()
                .ok_or_else(|| RegistryError::ClientNotFound(id.clone()))?
        };

        client.send_line(message, self.write_timeout).await?;
        Ok(())
    }

    /// Number of registered clients. May be stale as soon as it returns.
    pub async fn count(&self) -> usize {
        self.clients.read().await.len()
    }

    #[cfg(test)]
    pub async fn contains(&self, id: &ClientId) -> bool {
        self.clients.read().await.contains_key(id)
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncBufReadExt, AsyncWrite, BufReader, DuplexStream, Lines};
    use tokio::time::timeout;

    const READ_TIMEOUT: Duration = Duration::from_secs(2);

    /// A stream whose every write fails.
    struct BrokenWriter;

    impl AsyncWrite for BrokenWriter {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Err(std::io::ErrorKind::BrokenPipe.into()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    async fn connect(registry: &ClientRegistry) -> (ClientId, Lines<BufReader<DuplexStream>>) {
        let (server_end, client_end) = tokio::io::duplex(1024);
        let id = registry.next_id();
        let record = Arc::new(ClientRecord::new(id.clone(), "test", server_end));
        registry.register(record).await.unwrap();
        (id, BufReader::new(client_end).lines())
    }

    async fn recv(lines: &mut Lines<BufReader<DuplexStream>>) -> String {
        timeout(READ_TIMEOUT, lines.next_line())
            .await
            .expect("timed out waiting for line")
            .unwrap()
            .expect("stream closed")
    }

    async fn assert_silent(lines: &mut Lines<BufReader<DuplexStream>>) {
        let pending = timeout(Duration::from_millis(50), lines.next_line()).await;
        assert!(pending.is_err(), "unexpected line: {:?}", pending);
    }

    #[tokio::test]
    async fn ids_are_monotonic() {
        let registry = ClientRegistry::new();
        assert_eq!(registry.next_id().as_str(), "client-1");
        assert_eq!(registry.next_id().as_str(), "client-2");
        assert_eq!(registry.next_id().as_str(), "client-3");
    }

    #[tokio::test]
    async fn count_tracks_register_and_unregister() {
        let registry = ClientRegistry::new();
        let (a, _a_lines) = connect(&registry).await;
        let (b, _b_lines) = connect(&registry).await;
        assert_eq!(registry.count().await, 2);

        assert!(registry.unregister(&a).await.is_some());
        assert_eq!(registry.count().await, 1);
        assert!(registry.contains(&b).await);
        assert!(!registry.contains(&a).await);
    }

    #[tokio::test]
    async fn unregister_twice_is_a_no_op() {
        let registry = ClientRegistry::new();
        let (a, _a_lines) = connect(&registry).await;
        let (_b, _b_lines) = connect(&registry).await;

        assert!(registry.unregister(&a).await.is_some());
        assert!(registry.unregister(&a).await.is_none());
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected() {
        let registry = ClientRegistry::new();
        let id = registry.next_id();
        let first = Arc::new(ClientRecord::new(id.clone(), "test", BrokenWriter));
        let second = Arc::new(ClientRecord::new(id.clone(), "test", BrokenWriter));

        registry.register(first).await.unwrap();
        assert!(matches!(
            registry.register(second).await,
            Err(RegistryError::DuplicateId(_))
        ));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn capacity_limit_is_enforced() {
        let registry = ClientRegistry::with_limits(Some(1), None);
        let (_a, _a_lines) = connect(&registry).await;

        let record = Arc::new(ClientRecord::new(registry.next_id(), "test", BrokenWriter));
        assert!(matches!(
            registry.register(record).await,
            Err(RegistryError::CapacityReached(1))
        ));
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn broadcast_skips_the_excluded_client() {
        let registry = ClientRegistry::new();
        let (a, mut a_lines) = connect(&registry).await;
        let (_b, mut b_lines) = connect(&registry).await;
        let (_c, mut c_lines) = connect(&registry).await;

        let report = registry.broadcast("[alice] hi", &a).await;
        assert_eq!(report, BroadcastReport { delivered: 2, failed: 0 });

        assert_eq!(recv(&mut b_lines).await, "[alice] hi");
        assert_eq!(recv(&mut c_lines).await, "[alice] hi");
        assert_silent(&mut a_lines).await;
        assert_silent(&mut b_lines).await;
    }

    #[tokio::test]
    async fn broken_recipient_does_not_stop_delivery() {
        let registry = ClientRegistry::new();
        let (sender, _sender_lines) = connect(&registry).await;
        let broken = Arc::new(ClientRecord::new(registry.next_id(), "broken", BrokenWriter));
        registry.register(broken).await.unwrap();
        let (_b, mut b_lines) = connect(&registry).await;
        let (_c, mut c_lines) = connect(&registry).await;

        let report = registry.broadcast("still here", &sender).await;
        assert_eq!(report, BroadcastReport { delivered: 2, failed: 1 });
        assert_eq!(recv(&mut b_lines).await, "still here");
        assert_eq!(recv(&mut c_lines).await, "still here");
    }

    /// Registers a client whose pipe is already full, so writes to it stall.
    async fn connect_stalled(registry: &ClientRegistry) -> DuplexStream {
        let (server_end, client_end) = tokio::io::duplex(4);
        let record = Arc::new(ClientRecord::new(registry.next_id(), "stalled", server_end));
        registry.register(record).await.unwrap();
        client_end
    }

    #[tokio::test]
    async fn stalled_recipient_does_not_hold_the_registry() {
        for write_timeout in [Some(Duration::from_secs(2)), None] {
            let registry = Arc::new(ClientRegistry::with_limits(None, write_timeout));
            let (sender, _sender_lines) = connect(&registry).await;
            let _stalled = connect_stalled(&registry).await;

            let in_flight = {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    registry
                        .broadcast("a line far too long for the stalled pipe", &sender)
                        .await
                })
            };
            tokio::time::sleep(Duration::from_millis(50)).await;

            let late = Arc::new(ClientRecord::new(registry.next_id(), "late", BrokenWriter));
            timeout(Duration::from_millis(500), registry.register(late))
                .await
                .expect("register waited on an in-flight broadcast")
                .unwrap();
            assert_eq!(
                timeout(Duration::from_millis(500), registry.count()).await.unwrap(),
                3
            );

            in_flight.abort();
        }
    }

    #[tokio::test]
    async fn stalled_recipient_does_not_delay_the_others() {
        let registry = ClientRegistry::with_limits(None, Some(Duration::from_secs(2)));
        let (sender, _sender_lines) = connect(&registry).await;
        let _stalled = connect_stalled(&registry).await;
        let (_b, mut b_lines) = connect(&registry).await;

        let broadcast = registry.broadcast("hello everyone", &sender);
        let receive = async { timeout(Duration::from_millis(500), b_lines.next_line()).await };
        let (report, received) = tokio::join!(broadcast, receive);

        let line = received.expect("healthy recipient waited on the stalled one");
        assert_eq!(line.unwrap().as_deref(), Some("hello everyone"));
        assert_eq!(report, BroadcastReport { delivered: 1, failed: 1 });
    }

    #[tokio::test]
    async fn send_to_unknown_client_fails() {
        let registry = ClientRegistry::new();
        let ghost = registry.next_id();
        assert!(matches!(
            registry.send_to(&ghost, "hello").await,
            Err(SessionError::Registry(RegistryError::ClientNotFound(_)))
        ));
    }
}
