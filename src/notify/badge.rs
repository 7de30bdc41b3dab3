use anyhow::Context;
use std::path::PathBuf;

use super::BadgeSurface;

/// Writes the badge text to a file that status bars (waybar, polybar, tmux)
/// can poll. An empty file means "no badge".
pub struct BadgeFile {
    path: PathBuf,
    last: Option<String>,
}

impl BadgeFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last: None,
        }
    }
}

impl BadgeSurface for BadgeFile {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()> {
        if self.last.as_deref() == Some(text) {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, text)
            .with_context(|| format!("Writing badge to {:?}", self.path))?;
        self.last = Some(text.to_string());
        Ok(())
    }
}
