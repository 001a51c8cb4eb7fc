//! Line input on a blocking thread, with keystroke notifications.

use rustyline::{
    Context, Editor, Helper, completion::Completer, error::ReadlineError,
    highlight::Highlighter, hint::Hinter, history::DefaultHistory, validate::Validator,
};
use tokio::sync::mpsc;

use super::ui::SharedPrompt;

/// What the readline thread reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// The line being edited changed
    Keystroke,
    /// A line was submitted
    Line(String),
    /// Input ended (Ctrl+C, Ctrl+D, or a terminal error)
    Closed,
}

/// Reports every edit of a message line as a keystroke
///
/// rustyline asks the hinter for a hint after each edit, which is the only
/// per-keystroke hook it offers. Command lines (starting with `/`) are not
/// reported.
struct KeystrokeHelper {
    events: mpsc::UnboundedSender<InputEvent>,
}

impl Completer for KeystrokeHelper {
    type Candidate = String;
}

impl Highlighter for KeystrokeHelper {}

impl Validator for KeystrokeHelper {}

impl Hinter for KeystrokeHelper {
    type Hint = String;

    fn hint(&self, line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        if !line.is_empty() && !line.starts_with('/') {
            let _ = self.events.send(InputEvent::Keystroke);
        }
        None
    }
}

impl Helper for KeystrokeHelper {}

/// Spawn a blocking thread for rustyline (synchronous readline)
pub fn spawn_readline(
    prompt: SharedPrompt,
    events: mpsc::UnboundedSender<InputEvent>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut rl: Editor<KeystrokeHelper, DefaultHistory> = match Editor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to initialize readline: {}", e);
                let _ = events.send(InputEvent::Closed);
                return;
            }
        };
        rl.set_helper(Some(KeystrokeHelper {
            events: events.clone(),
        }));

        loop {
            let current_prompt = prompt
                .lock()
                .map(|p| p.clone())
                .unwrap_or_else(|_| "> ".to_string());

            match rl.readline(&current_prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    rl.add_history_entry(line).ok();
                    if events.send(InputEvent::Line(line.to_string())).is_err() {
                        // Channel closed, exit thread
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    let _ = events.send(InputEvent::Closed);
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    let _ = events.send(InputEvent::Closed);
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    let _ = events.send(InputEvent::Closed);
                    break;
                }
            }
        }
    })
}
