pub mod client;
pub mod console;
pub mod error;
pub mod middleware;
pub mod protocol;
pub mod server;
pub mod transport;
pub mod utils;

pub use client::{ClientRegistry, SessionSettings};
pub use server::{Server, ServerConfig};
