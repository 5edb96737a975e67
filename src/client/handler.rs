use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

use crate::client::{ClientRecord, ClientRegistry, ClientState};
use crate::error::handlers::{handle_error, log_stream_error};
use crate::error::{ChatServerError, RegistryError, SessionError};
use crate::middleware::RateLimiter;
use crate::middleware::logging::{log_chat, log_connection, log_disconnection, log_username};
use crate::protocol::responses;
use crate::protocol::{Frame, LineFramer};
use crate::server::config::ServerConfig;

/// Per-session knobs, derived once from `ServerConfig` and shared.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub max_line_length: Option<usize>,
    pub rate_limit: Option<(usize, Duration)>,
    pub default_username: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for SessionSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            max_line_length: config.max_line_limit(),
            rate_limit: config.rate_limit(),
            default_username: config.default_username.clone(),
        }
    }
}

/// Runs one client from connect to disconnect.
///
/// - Registers a fresh `ClientRecord` and greets the client privately.
/// - Runs the chat loop in its own task.
/// - Whatever way that task ends (clean EOF, stream error, panic), the client
///   is unregistered and, if it had a username, the others are told it left.
pub async fn handle_session<S>(
    stream: S,
    peer: String,
    registry: Arc<ClientRegistry>,
    settings: Arc<SessionSettings>,
) where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);

    let client_id = registry.next_id();
    let record = Arc::new(ClientRecord::new(client_id.clone(), peer, write_half));

    if let Err(e) = registry.register(Arc::clone(&record)).await {
        reject(&record, &registry, e).await;
        return;
    }
    log_connection(&client_id, record.peer(), registry.count().await);

    let session = tokio::spawn(run_session(
        read_half,
        Arc::clone(&record),
        Arc::clone(&registry),
        settings,
    ));
    let outcome = session.await;

    registry.unregister(&client_id).await;

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => handle_error(&ChatServerError::from(e)),
        Err(e) => error!("Session task for {} failed: {}", client_id, e),
    }

    if let Some(username) = record.username().await {
        registry
            .broadcast(&responses::left(&username), &client_id)
            .await;
    }

    record.close().await;
    log_disconnection(&client_id, registry.count().await);
}

async fn reject(record: &ClientRecord, registry: &ClientRegistry, reason: RegistryError) {
    warn!("Refusing {} from {}: {}", record.id(), record.peer(), reason);

    if let RegistryError::CapacityReached(_) = reason {
        if let Err(e) = record
            .send_line(responses::SERVER_FULL, registry.write_timeout())
            .await
        {
            debug!("Could not tell {} the server is full: {}", record.id(), e);
        }
    }
    record.close().await;
}

/// Chat loop for one registered client.
///
/// Read errors end the session the same way end-of-stream does; errors
/// writing to this client's own stream are returned.
async fn run_session<R>(
    reader: R,
    record: Arc<ClientRecord>,
    registry: Arc<ClientRegistry>,
    settings: Arc<SessionSettings>,
) -> Result<(), SessionError>
where
    R: AsyncRead + Unpin,
{
    let client_id = record.id().clone();

    registry
        .send_to(&client_id, &responses::welcome(&client_id))
        .await?;
    registry
        .send_to(&client_id, &responses::population(registry.count().await))
        .await?;

    let mut framer = LineFramer::new(BufReader::new(reader), settings.max_line_length);
    let mut limiter = settings
        .rate_limit
        .map(|(max_messages, window)| RateLimiter::new(max_messages, window));

    loop {
        let frame = match framer.next_frame().await {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("Connection closed by client {}", client_id);
                break;
            }
            Err(e) => {
                log_stream_error(&client_id, &e);
                break;
            }
        };

        match frame {
            Frame::Oversized { limit } => {
                warn!("Dropped oversized line from {}", client_id);
                registry
                    .send_to(&client_id, &responses::line_too_long(limit))
                    .await?;
            }
            Frame::Line(line) => {
                handle_line(&record, &registry, &settings, limiter.as_mut(), line).await?;
            }
        }
    }

    Ok(())
}

async fn handle_line(
    record: &ClientRecord,
    registry: &ClientRegistry,
    settings: &SessionSettings,
    limiter: Option<&mut RateLimiter>,
    line: String,
) -> Result<(), SessionError> {
    let client_id = record.id();

    match record.state().await {
        ClientState::AwaitingUsername => {
            let username = choose_username(&line, settings.default_username.as_deref());
            record.set_username(username.clone()).await?;
            log_username(client_id, &username);

            registry
                .broadcast(&responses::joined(&username), client_id)
                .await;
            registry
                .send_to(client_id, responses::USERNAME_CONFIRMED)
                .await?;
        }
        ClientState::Chatting { username } => {
            if let Some(limiter) = limiter {
                if !limiter.is_allowed() {
                    warn!("Rate limited {}", client_id);
                    registry.send_to(client_id, responses::RATE_LIMITED).await?;
                    return Ok(());
                }
            }

            let message = responses::chat(&username, &line);
            log_chat(client_id, &message);
            registry.broadcast(&message, client_id).await;
        }
    }

    Ok(())
}

/// The trimmed first line is the username, blank included, unless a
/// default name is configured for blank input.
fn choose_username(line: &str, default_username: Option<&str>) -> String {
    let trimmed = line.trim();
    match default_username {
        Some(default) if trimmed.is_empty() => default.to_string(),
        _ => trimmed.to_string(),
    }
}
