//! Chat wire protocol
//!
//! Newline-terminated text lines: framing, server message formats and the
//! client-side command parser.

pub mod commands;
pub mod framer;
pub mod responses;

pub use commands::{ClientInput, parse_client_input};
pub use framer::{Frame, LineFramer};
