use tracing::debug;

use crate::error::{FinderError, Result};

/// Open `url` in the default browser
pub fn open_in_browser(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(FinderError::Validation("No URL to open".to_string()));
    }
    debug!(url, "opening in browser");
    open::that(url)?;
    Ok(())
}

pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new()
        .map_err(|e| FinderError::Api(format!("failed to access system clipboard: {}", e)))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| FinderError::Api(format!("failed to copy to clipboard: {}", e)))?;
    debug!(chars = text.len(), "copied to clipboard");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_url_is_rejected_without_launching() {
        assert!(matches!(
            open_in_browser(""),
            Err(FinderError::Validation(_))
        ));
    }
}
