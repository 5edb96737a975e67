//! Line-based chat client
//!
//! Copies what the user types to the server and prints whatever the server
//! sends. `/quit` and `/exit` are handled here and never reach the server.

use log::{debug, info};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::ConfigError;
use crate::protocol::{ClientInput, parse_client_input};
use crate::server::config::{CONFIG_PATHS, layered_sources};

/// Client configuration, read from the same sources as the server's.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ClientConfig {
    /// Server to connect to, `CHAT_RELAY_SERVER_ADDRESS`
    pub server_address: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1:4242".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&CONFIG_PATHS)
    }

    pub fn load_from(paths: &[&str]) -> Result<Self, ConfigError> {
        let config: ClientConfig = layered_sources(paths).build()?.try_deserialize()?;
        if config.server_address.trim().is_empty() {
            return Err(ConfigError::Invalid("server_address cannot be empty".into()));
        }
        Ok(config)
    }
}

/// Runs the client until the user exits, input ends, or the server hangs up.
///
/// On exit the write side of `stream` is shut down so the server sees a
/// clean end-of-stream.
pub async fn run_console<S, I, O>(stream: S, input: I, output: O) -> std::io::Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Send + Unpin + 'static,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut printer = tokio::spawn(print_incoming(read_half, output));
    let mut lines = input.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("Input closed");
                    break;
                };

                match parse_client_input(&line) {
                    ClientInput::Exit => {
                        info!("Leaving chat");
                        break;
                    }
                    ClientInput::Message(message) => {
                        write_half.write_all(format!("{}\n", message).as_bytes()).await?;
                        write_half.flush().await?;
                    }
                }
            }
            _ = &mut printer => {
                info!("Server closed the connection");
                return Ok(());
            }
        }
    }

    write_half.shutdown().await?;
    printer.abort();
    Ok(())
}

async fn print_incoming<R, O>(reader: R, mut output: O) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    O: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        output.write_all(format!("{}\n", line).as_bytes()).await?;
        output.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn quit_stops_sending_and_closes_the_stream() {
        let (client_end, server_end) = tokio::io::duplex(1024);
        let (output, _output_reader) = tokio::io::duplex(1024);
        let input = BufReader::new(&b"alice\nhello\n/quit\nnever sent\n"[..]);

        timeout(
            Duration::from_secs(2),
            run_console(client_end, input, output),
        )
        .await
        .unwrap()
        .unwrap();

        let mut received = BufReader::new(server_end).lines();
        assert_eq!(received.next_line().await.unwrap().as_deref(), Some("alice"));
        assert_eq!(received.next_line().await.unwrap().as_deref(), Some("hello"));
        assert_eq!(received.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn server_lines_are_printed() {
        let (client_end, mut server_end) = tokio::io::duplex(1024);
        let (output, output_reader) = tokio::io::duplex(1024);
        let (mut user, user_input) = tokio::io::duplex(1024);

        let console = tokio::spawn(run_console(client_end, BufReader::new(user_input), output));

        server_end.write_all(b"[SERVER] hello\n").await.unwrap();
        let mut printed = BufReader::new(output_reader).lines();
        let line = timeout(Duration::from_secs(2), printed.next_line())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(line.as_deref(), Some("[SERVER] hello"));

        user.write_all(b"/exit\n").await.unwrap();
        timeout(Duration::from_secs(2), console)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[test]
    fn default_server_address() {
        assert_eq!(ClientConfig::default().server_address, "127.0.0.1:4242");
    }
}
