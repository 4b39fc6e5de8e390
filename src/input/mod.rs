//! Input handling
//!
//! Each line typed at the prompt is either new text to read or a `:command`.

pub mod command;
pub mod handler;

pub use command::{parse_command, Command, VoiceChoice};
pub use handler::{CommandHandler, HandlerAction};
