//! Parsing of terminal input lines into chat commands.
//!
//! Pure functions, tested without a terminal.

use thiserror::Error;

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text for the current room
    Say(String),
    Join(String),
    /// Leave the given room, or the current one
    Leave(Option<String>),
    Switch(String),
    Reply {
        message_id: String,
        body: String,
    },
    Share {
        resource_id: String,
        resource_link: String,
        comment: String,
    },
    History,
    /// Open a new connection after reconnecting gave up
    Reconnect,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Unknown command '/{0}' (try /help)")]
    Unknown(String),
}

/// Parse one input line; `Ok(None)` for a blank line
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Say(line.to_string())));
    };

    let (name, args) = split_word(rest);
    let command = match name {
        "join" | "j" => Command::Join(single_argument(args, "/join <room>")?),
        "leave" => Command::Leave(first_word(args)),
        "room" | "r" => Command::Switch(single_argument(args, "/room <room>")?),
        "reply" => {
            let (message_id, body) = split_word(args);
            if message_id.is_empty() || body.is_empty() {
                return Err(CommandError::Usage("/reply <message-id> <text>"));
            }
            Command::Reply {
                message_id: message_id.to_string(),
                body: body.to_string(),
            }
        }
        "share" => {
            let (resource_id, rest) = split_word(args);
            let (resource_link, comment) = split_word(rest);
            if resource_id.is_empty() || resource_link.is_empty() {
                return Err(CommandError::Usage("/share <resource-id> <link> [comment]"));
            }
            Command::Share {
                resource_id: resource_id.to_string(),
                resource_link: resource_link.to_string(),
                comment: comment.to_string(),
            }
        }
        "history" | "h" => Command::History,
        "reconnect" => Command::Reconnect,
        "help" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

/// Split off the first whitespace-delimited word
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (input, ""),
    }
}

fn first_word(input: &str) -> Option<String> {
    let (word, _) = split_word(input);
    (!word.is_empty()).then(|| word.to_string())
}

fn single_argument(input: &str, usage: &'static str) -> Result<String, CommandError> {
    first_word(input).ok_or(CommandError::Usage(usage))
}
