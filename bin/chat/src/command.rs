//! Parsing of chat input lines.

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send the text to the assistant.
    Say(String),
    /// Forget the current conversation and start over.
    Reset,
    /// Forget every conversation.
    ResetAll,
    /// Print the retained history of the current conversation.
    History,
    /// List the assistants available to the credential.
    Assistants,
    /// Route further messages to another assistant.
    Use(String),
    /// Print the command list.
    Help,
    /// Leave the chat.
    Quit,
    /// A slash command that is not recognized.
    Unknown(String),
    /// Nothing but whitespace.
    Blank,
}

/// Command list shown by `/help`.
pub const HELP: &str = "\
/reset              forget this conversation and start a new one
/reset-all          forget every conversation
/history            show the retained turns of this conversation
/assistants         list available assistants
/use <assistant>    send further messages to another assistant
/quit               leave";

/// Parses one input line.
#[must_use]
pub fn parse(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Blank;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Say(line.to_string());
    };

    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };
    match (name, argument) {
        ("reset", "") => Command::Reset,
        ("reset-all", "") => Command::ResetAll,
        ("history", "") => Command::History,
        ("assistants", "") => Command::Assistants,
        ("use", id) if !id.is_empty() => Command::Use(id.to_string()),
        ("help", "") => Command::Help,
        ("quit" | "exit", "") => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}
