//! Error types
//!
//! Defines domain-specific error types for each part of the chat relay.

use std::fmt;
use std::io;

use crate::client::ClientId;

/// Client registry errors
#[derive(Debug)]
pub enum RegistryError {
    DuplicateId(ClientId),
    CapacityReached(usize),
    ClientNotFound(ClientId),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateId(id) => write!(f, "Client id already registered: {}", id),
            RegistryError::CapacityReached(max) => {
                write!(f, "Client limit reached ({} clients)", max)
            }
            RegistryError::ClientNotFound(id) => write!(f, "Client not found: {}", id),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Per-connection session errors
#[derive(Debug)]
pub enum SessionError {
    UsernameAlreadySet(ClientId),
    Registry(RegistryError),
    Io(io::Error),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::UsernameAlreadySet(id) => {
                write!(f, "Username already set for client {}", id)
            }
            SessionError::Registry(e) => write!(f, "Registry error: {}", e),
            SessionError::Io(e) => write!(f, "Stream error: {}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<io::Error> for SessionError {
    fn from(error: io::Error) -> Self {
        SessionError::Io(error)
    }
}

impl From<RegistryError> for SessionError {
    fn from(error: RegistryError) -> Self {
        SessionError::Registry(error)
    }
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    Load(config::ConfigError),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Load(e) => write!(f, "Failed to load configuration: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(error: config::ConfigError) -> Self {
        ConfigError::Load(error)
    }
}

/// General chat server error that encompasses all error types
#[derive(Debug)]
pub enum ChatServerError {
    Config(ConfigError),
    Registry(RegistryError),
    Session(SessionError),
    IoError(io::Error),
    NetworkError(String),
}

impl fmt::Display for ChatServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatServerError::Config(e) => write!(f, "Configuration error: {}", e),
            ChatServerError::Registry(e) => write!(f, "Registry error: {}", e),
            ChatServerError::Session(e) => write!(f, "Session error: {}", e),
            ChatServerError::IoError(e) => write!(f, "I/O error: {}", e),
            ChatServerError::NetworkError(e) => write!(f, "Network error: {}", e),
        }
    }
}

impl std::error::Error for ChatServerError {}

impl From<ConfigError> for ChatServerError {
    fn from(error: ConfigError) -> Self {
        ChatServerError::Config(error)
    }
}

impl From<RegistryError> for ChatServerError {
    fn from(error: RegistryError) -> Self {
        ChatServerError::Registry(error)
    }
}

impl From<SessionError> for ChatServerError {
    fn from(error: SessionError) -> Self {
        ChatServerError::Session(error)
    }
}

impl From<io::Error> for ChatServerError {
    fn from(error: io::Error) -> Self {
        ChatServerError::IoError(error)
    }
}
