//! Terminal chat client built on [`ChatClient`](crate::chat::ChatClient).

mod command;
mod formatter;
mod input;
mod runner;
mod ui;

pub use runner::run_client;
