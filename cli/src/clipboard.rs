use arboard::Clipboard;

/// System clipboard handle. Headless sessions have no clipboard; copies
/// then report failure instead of erroring.
pub struct ClipboardManager {
    clipboard: Option<Clipboard>,
}

impl ClipboardManager {
    #[must_use]
    pub fn new() -> Self {
        Self { clipboard: Clipboard::new().ok() }
    }

    /// Copy text to the clipboard. Returns whether it succeeded.
    pub fn copy(&mut self, text: &str) -> bool {
        if let Some(ref mut clipboard) = self.clipboard {
            clipboard.set_text(text).is_ok()
        } else {
            false
        }
    }
}

impl Default for ClipboardManager {
    fn default() -> Self {
        Self::new()
    }
}
