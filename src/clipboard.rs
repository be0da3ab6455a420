//! System clipboard access for copying article links.

use anyhow::{Context, Result};

/// Somewhere text can be copied to.
pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard via `arboard`.
///
/// The handle is opened on first use and then kept: on X11 the copied text
/// is only served while the handle is alive.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<()> {
        let mut clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new().context("Clipboard unavailable")?,
        };
        let result = clipboard
            .set_text(text)
            .context("Failed to write to clipboard");
        self.inner = Some(clipboard);
        result
    }
}
