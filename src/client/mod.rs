//! Client management system
//!
//! Handles client records, the shared registry and the per-connection
//! session lifecycle.

pub mod handler;
pub mod registry;
pub mod state;

pub use handler::{SessionSettings, handle_session};
pub use registry::{BroadcastReport, ClientRegistry};
pub use state::{ClientId, ClientRecord, ClientState, Outbound};
