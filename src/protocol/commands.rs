//! Module `commands`
//!
//! Parses what a user types into the chat client. The server never sees
//! these commands: `/quit` and `/exit` only end the client's own loop.

/// One line of user input, as the client understands it.
#[derive(Debug, PartialEq, Eq)]
pub enum ClientInput {
    Exit,
    Message(String),
}

/// Classifies a raw input line.
///
/// Exit commands are matched exactly and case-sensitively after trimming.
/// Anything else is sent as-is.
pub fn parse_client_input(raw: &str) -> ClientInput {
    match raw.trim() {
        "/quit" | "/exit" => ClientInput::Exit,
        _ => ClientInput::Message(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_commands() {
        assert_eq!(parse_client_input("/quit"), ClientInput::Exit);
        assert_eq!(parse_client_input("  /exit \r"), ClientInput::Exit);
    }

    #[test]
    fn exit_commands_are_case_sensitive_and_exact() {
        assert_eq!(
            parse_client_input("/QUIT"),
            ClientInput::Message("/QUIT".into())
        );
        assert_eq!(
            parse_client_input("/quit now"),
            ClientInput::Message("/quit now".into())
        );
    }

    #[test]
    fn messages_are_passed_through_untrimmed() {
        assert_eq!(
            parse_client_input(" hi there "),
            ClientInput::Message(" hi there ".into())
        );
    }
}
