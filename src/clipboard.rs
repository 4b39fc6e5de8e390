//! Clipboard integration

use crate::{ReadAloudError, Result};
use arboard::Clipboard;
use log::debug;

/// Get text from system clipboard
///
/// Used by `:paste` to load the editor from whatever the user copied.
pub fn get_from_clipboard() -> Result<String> {
    debug!("Getting text from clipboard");

    let mut clipboard = Clipboard::new()
        .map_err(|e| ReadAloudError::Clipboard(format!("Failed to open clipboard: {}", e)))?;

    let text = clipboard
        .get_text()
        .map_err(|e| ReadAloudError::Clipboard(format!("Failed to get from clipboard: {}", e)))?;

    debug!("Clipboard held {} chars", text.len());
    Ok(text)
}
