//! Terminal chat session.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use super::{
    command::{Command, parse_command},
    formatter::MessageFormatter,
    input::{InputEvent, spawn_readline},
    ui::{SharedPrompt, redisplay_prompt, set_prompt},
};
use crate::{
    channel::MessageDraft,
    chat::{ChatClient, ChatUpdate},
    config::ClientConfig,
    error::ClientError,
};

enum Flow {
    Continue,
    Quit,
}

struct Session {
    client: ChatClient,
    current_room: Option<String>,
    prompt: SharedPrompt,
}

/// Run the terminal chat client until the user quits or the connection closes
///
/// When reconnecting gives up the session stays open; `/reconnect` tries again.
pub async fn run_client(
    config: ClientConfig,
    rooms: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Connecting to {} as '{}'",
        config.server_url,
        config.identity.user_id
    );
    let client = ChatClient::connect(config).await?;

    let mut session = Session {
        client,
        current_room: None,
        prompt: Arc::new(Mutex::new(String::new())),
    };
    println!(
        "\nYou are '{}' ({}). Type /help for commands. Press Ctrl+C to exit.\n",
        session.client.identity().user_name,
        session.client.identity().user_id
    );
    for room_id in rooms {
        session.join(&room_id).await;
    }
    session.refresh_prompt();

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    let _readline_handle = spawn_readline(Arc::clone(&session.prompt), input_tx);

    let result = loop {
        tokio::select! {
            input = input_rx.recv() => match input {
                Some(InputEvent::Keystroke) => session.keystroke(),
                Some(InputEvent::Line(line)) => {
                    if let Flow::Quit = session.handle_line(&line).await {
                        break Ok(());
                    }
                }
                Some(InputEvent::Closed) | None => break Ok(()),
            },
            update = session.client.next_update() => match update {
                Some(update) => session.render(update),
                None => break Err(ClientError::Disconnected),
            },
        }
    };

    session.client.disconnect().await;
    result?;
    Ok(())
}

impl Session {
    fn keystroke(&mut self) {
        let Some(room_id) = &self.current_room else {
            return;
        };
        if let Err(e) = self.client.keystroke(room_id) {
            tracing::debug!("Keystroke ignored: {}", e);
        }
    }

    async fn handle_line(&mut self, line: &str) -> Flow {
        let command = match parse_command(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Flow::Continue,
            Err(e) => {
                print!("{}", MessageFormatter::format_error(&e.to_string()));
                self.redisplay();
                return Flow::Continue;
            }
        };

        match command {
            Command::Say(text) => self.send(MessageDraft::text(text)).await,
            Command::Reply { message_id, body } => {
                self.send(MessageDraft::text(body).replying_to(message_id))
                    .await
            }
            Command::Share {
                resource_id,
                resource_link,
                comment,
            } => {
                self.send(MessageDraft::resource_share(
                    comment,
                    resource_id,
                    resource_link,
                ))
                .await
            }
            Command::Join(room_id) => self.join(&room_id).await,
            Command::Leave(room_id) => self.leave(room_id),
            Command::Switch(room_id) => {
                if self.client.is_joined(&room_id) {
                    self.current_room = Some(room_id);
                } else {
                    print!(
                        "{}",
                        MessageFormatter::format_error(&ClientError::NotJoined(room_id).to_string())
                    );
                }
            }
            Command::History => match &self.current_room {
                Some(room_id) => {
                    let messages = self.client.sorted_by_time(room_id);
                    print!(
                        "{}",
                        MessageFormatter::format_room_history(
                            room_id,
                            &messages,
                            &self.client.identity().user_id
                        )
                    );
                }
                None => print!("{}", MessageFormatter::format_error("No room selected")),
            },
            Command::Reconnect => self.reconnect().await,
            Command::Help => print!("{}", MessageFormatter::format_help()),
            Command::Quit => return Flow::Quit,
        }

        self.refresh_prompt();
        self.redisplay();
        Flow::Continue
    }

    async fn send(&mut self, draft: MessageDraft) {
        let Some(room_id) = self.current_room.clone() else {
            print!(
                "{}",
                MessageFormatter::format_error("No room selected (use /join <room>)")
            );
            return;
        };
        if let Err(e) = self.client.send_message(&room_id, draft).await {
            tracing::warn!("Failed to send message to '{}': {}", room_id, e);
            print!("{}", MessageFormatter::format_error(&e.to_string()));
        }
    }

    async fn reconnect(&mut self) {
        match self.client.reconnect().await {
            Ok(session_id) => tracing::info!("Reconnected as session '{}'", session_id),
            Err(e) => {
                tracing::warn!("Reconnect failed: {}", e);
                print!(
                    "{}",
                    MessageFormatter::format_error(&format!("Could not reconnect: {}", e))
                );
            }
        }
    }

    async fn join(&mut self, room_id: &str) {
        match self.client.join(room_id).await {
            Ok(true) => print!("{}", MessageFormatter::format_room_joined(room_id)),
            Ok(false) => {}
            Err(e) => {
                print!(
                    "{}",
                    MessageFormatter::format_error(&format!("Could not join #{}: {}", room_id, e))
                );
                return;
            }
        }
        self.current_room = Some(room_id.to_string());
    }

    fn leave(&mut self, room_id: Option<String>) {
        let Some(room_id) = room_id.or_else(|| self.current_room.clone()) else {
            print!("{}", MessageFormatter::format_error("No room selected"));
            return;
        };
        if !self.client.leave(&room_id) {
            print!(
                "{}",
                MessageFormatter::format_error(&ClientError::NotJoined(room_id).to_string())
            );
            return;
        }
        print!("{}", MessageFormatter::format_room_left(&room_id));
        if self.current_room.as_deref() == Some(room_id.as_str()) {
            self.current_room = self.client.rooms().into_iter().next();
        }
    }

    fn render(&self, update: ChatUpdate) {
        let me = &self.client.identity().user_id;
        let output = match update {
            ChatUpdate::MessageAppended { message, .. } => {
                MessageFormatter::format_chat_message(&message, me)
            }
            ChatUpdate::HistoryMerged { room_id, added } => {
                if added == 0 {
                    return;
                }
                let messages = self.client.sorted_by_time(&room_id);
                MessageFormatter::format_room_history(&room_id, &messages, me)
            }
            ChatUpdate::TypingChanged { room_id, indicator } => {
                MessageFormatter::format_typing(&room_id, indicator.as_deref())
            }
            ChatUpdate::ConnectionChanged(state) => {
                MessageFormatter::format_connection_state(&state)
            }
            ChatUpdate::Error(message) => MessageFormatter::format_error(&message),
        };
        if output.is_empty() {
            return;
        }
        print!("{}", output);
        self.redisplay();
    }

    fn refresh_prompt(&self) {
        set_prompt(&self.prompt, self.current_room.as_deref());
    }

    fn redisplay(&self) {
        redisplay_prompt(self.current_room.as_deref());
    }
}
