//! readaloud - Terminal read-aloud tool
//!
//! Type text, pick a voice, and have the system speech engine read it aloud.
//! The speech engine does all synthesis; this crate keeps the UI state in step
//! with it.

pub mod clipboard;
pub mod error;
pub mod input;
pub mod speech;
pub mod state;
pub mod ui;

pub use error::{ReadAloudError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "readaloud";
