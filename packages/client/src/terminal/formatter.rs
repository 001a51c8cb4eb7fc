//! Message formatting utilities for the terminal client.

use studyhall_shared::{
    dto::{MessageDto, MessageKindDto},
    time::{timestamp_to_clock_label, timestamp_to_rfc3339},
};

use crate::connection::ConnectionState;

const SEPARATOR: &str = "------------------------------------------------------------";
const HEAVY_SEPARATOR: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a room's history, framed by separator lines
    ///
    /// # Arguments
    ///
    /// * `room_id` - The room
    /// * `messages` - The room's messages, oldest first
    /// * `current_user_id` - The local user's ID (to mark as "me")
    pub fn format_room_history(room_id: &str, messages: &[&MessageDto], current_user_id: &str) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\n", HEAVY_SEPARATOR));
        output.push_str(&format!("#{} ({} messages)\n", room_id, messages.len()));

        if messages.is_empty() {
            output.push_str("(No messages yet)\n");
        } else {
            for message in messages {
                output.push_str(&Self::format_history_line(message, current_user_id));
            }
        }

        output.push_str(&format!("{}\n", HEAVY_SEPARATOR));
        output
    }

    pub fn format_room_joined(room_id: &str) -> String {
        format!("\n+ joined #{}\n", room_id)
    }

    /// Format one compact history line: `[HH:MM] name: body`
    pub fn format_history_line(message: &MessageDto, current_user_id: &str) -> String {
        let me_suffix = if message.author.user_id == current_user_id {
            " (me)"
        } else {
            ""
        };
        format!(
            "[{}] {}{}: {}\n",
            timestamp_to_clock_label(message.created_at),
            message.author.user_name,
            me_suffix,
            Self::summary(message)
        )
    }

    /// Format a live chat message, including its reply and resource details
    pub fn format_chat_message(message: &MessageDto, current_user_id: &str) -> String {
        let me_suffix = if message.author.user_id == current_user_id {
            " (me)"
        } else {
            ""
        };

        let mut output = format!("\n\n{}\n", SEPARATOR);
        if let Some(reply) = &message.reply_to {
            output.push_str(&format!("> {}: {}\n", reply.author_name, reply.snippet));
        }
        output.push_str(&format!(
            "#{} @{}{}: {}\n",
            message.room_id, message.author.user_name, me_suffix, message.body
        ));
        if let Some(resource) = &message.resource {
            output.push_str(&format!(
                "shared resource {}: {}\n",
                resource.resource_id, resource.resource_link
            ));
        }
        output.push_str(&format!(
            "id {} - sent at {}\n",
            message.id,
            timestamp_to_rfc3339(message.created_at)
        ));
        output.push_str(&format!("{}\n", SEPARATOR));
        output
    }

    /// Format a room's typing indicator; an empty indicator clears the line
    pub fn format_typing(room_id: &str, indicator: Option<&str>) -> String {
        match indicator {
            Some(text) => format!("\n#{} {}\n", room_id, text),
            None => String::new(),
        }
    }

    pub fn format_connection_state(state: &ConnectionState) -> String {
        match state {
            ConnectionState::Disconnected => "\n* Disconnected\n".to_string(),
            ConnectionState::Connecting => "\n* Connecting...\n".to_string(),
            ConnectionState::Connected { session_id } => {
                format!("\n* Connected (session {})\n", session_id)
            }
            ConnectionState::Reconnecting { attempt } => {
                format!("\n* Connection lost, reconnecting (attempt {})...\n", attempt)
            }
            ConnectionState::Failed => {
                "\n* Disconnected: could not reconnect. Sending is blocked until /reconnect succeeds.\n"
                    .to_string()
            }
        }
    }

    pub fn format_room_left(room_id: &str) -> String {
        format!("\n- left #{}\n", room_id)
    }

    pub fn format_error(message: &str) -> String {
        format!("\n! {}\n", message)
    }

    pub fn format_help() -> String {
        [
            "Commands:",
            "  /join <room>                    join a room and switch to it",
            "  /leave [room]                   leave a room (default: current)",
            "  /room <room>                    switch the current room",
            "  /reply <message-id> <text>      reply to a message",
            "  /share <id> <link> [comment]    share a study resource",
            "  /history                        show the current room's messages",
            "  /reconnect                      connect again after the connection failed",
            "  /quit                           exit",
            "Anything else is sent to the current room.",
        ]
        .join("\n")
            + "\n"
    }

    fn summary(message: &MessageDto) -> String {
        match message.kind {
            MessageKindDto::Text => message.body.clone(),
            MessageKindDto::ResourceShare => {
                let link = message
                    .resource
                    .as_ref()
                    .map(|r| r.resource_link.as_str())
                    .unwrap_or("?");
                if message.body.is_empty() {
                    format!("[resource] {}", link)
                } else {
                    format!("[resource] {} ({})", link, message.body)
                }
            }
        }
    }
}
