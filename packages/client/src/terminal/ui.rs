//! UI utilities for the terminal client.

use std::{
    io::Write,
    sync::{Arc, Mutex},
};

/// Prompt text shared with the readline thread
pub type SharedPrompt = Arc<Mutex<String>>;

pub fn prompt_for(room_id: Option<&str>) -> String {
    match room_id {
        Some(room_id) => format!("#{}> ", room_id),
        None => "> ".to_string(),
    }
}

/// Update the prompt used by the next readline call
pub fn set_prompt(prompt: &SharedPrompt, room_id: Option<&str>) {
    if let Ok(mut current) = prompt.lock() {
        *current = prompt_for(room_id);
    }
}

/// Redisplay the prompt after printing output
pub fn redisplay_prompt(room_id: Option<&str>) {
    print!("{}", prompt_for(room_id));
    std::io::stdout().flush().ok();
}
