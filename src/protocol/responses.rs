//! Chat message formats
//!
//! Every line the server writes, private or broadcast, is built here.

use crate::client::ClientId;

pub const SERVER_PREFIX: &str = "[SERVER]";

pub const USERNAME_CONFIRMED: &str = "[SERVER] Username set! Start chatting.";
pub const SERVER_FULL: &str = "[SERVER] Server is full. Try again later.";
pub const RATE_LIMITED: &str = "[SERVER] Slow down! Message dropped.";

/// Private greeting sent as soon as a client is registered.
pub fn welcome(id: &ClientId) -> String {
    format!(
        "{} Welcome to the chat relay! You are {}. Type your username to start chatting.",
        SERVER_PREFIX, id
    )
}

pub fn population(count: usize) -> String {
    format!("{} Currently {} users online", SERVER_PREFIX, count)
}

pub fn line_too_long(limit: usize) -> String {
    format!("{} Message too long (limit {} bytes)", SERVER_PREFIX, limit)
}

pub fn joined(username: &str) -> String {
    format!("{} {} joined the chat!", SERVER_PREFIX, username)
}

pub fn left(username: &str) -> String {
    format!("{} {} left the chat", SERVER_PREFIX, username)
}

pub fn chat(username: &str, message: &str) -> String {
    format!("[{}] {}", username, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_formats() {
        assert_eq!(joined("bob"), "[SERVER] bob joined the chat!");
        assert_eq!(left("alice"), "[SERVER] alice left the chat");
        assert_eq!(chat("bob", "hi"), "[bob] hi");
        assert_eq!(chat("bob", "  spaced "), "[bob]   spaced ");
    }

    #[test]
    fn private_formats() {
        let id = ClientId::from_sequence(3);
        assert!(welcome(&id).starts_with("[SERVER] Welcome"));
        assert!(welcome(&id).contains("You are client-3."));
        assert_eq!(population(2), "[SERVER] Currently 2 users online");
    }
}
