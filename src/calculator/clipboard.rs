//! Clipboard access for the poller and for copying results back.

use anyhow::{Context, Result};
use arboard::Clipboard;

/// Copy text to the system clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;

    clipboard
        .set_text(text.to_string())
        .context("Failed to copy to clipboard")
}

/// A long-lived clipboard handle that reads the current text.
pub struct ClipboardSource {
    clipboard: Clipboard,
}

impl ClipboardSource {
    pub fn new() -> Result<Self> {
        let clipboard = Clipboard::new().context("Failed to access clipboard")?;
        Ok(Self { clipboard })
    }

    /// The clipboard text, or `None` when it holds no text.
    pub fn read_text(&mut self) -> Result<Option<String>> {
        match self.clipboard.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(e).context("Failed to read clipboard"),
        }
    }
}
