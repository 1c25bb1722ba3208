//! Clipboard access for the Paste button

use arboard::Clipboard;

/// Read text from the system clipboard, trimmed. Empty clipboards are an
/// error so the UI can say so instead of clearing the field.
pub fn paste_text() -> Result<String, String> {
    let mut clipboard =
        Clipboard::new().map_err(|e| format!("Failed to access clipboard: {}", e))?;

    let text = clipboard
        .get_text()
        .map_err(|e| format!("Failed to read clipboard: {}", e))?;

    let text = text.trim();
    if text.is_empty() {
        Err("Clipboard is empty".to_string())
    } else {
        Ok(text.to_string())
    }
}
