//! Server core functionality
//!
//! This module contains the listener loop and the server configuration.

pub mod config;
pub mod core;

pub use config::ServerConfig;
pub use core::Server;
