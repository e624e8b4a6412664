//! Persisted client preferences.
//!
//! Stored as JSON at `$CHATBOT_PREFS`, else
//! `$XDG_CONFIG_HOME/chatbot/prefs.json`, else `~/.config/chatbot/prefs.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("failed to write preferences: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode preferences: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefs {
    pub dark_mode: bool,
}

#[must_use]
pub fn prefs_path() -> PathBuf {
    if let Ok(path) = std::env::var("CHATBOT_PREFS") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home.join(".config"))
        .join("chatbot")
        .join("prefs.json")
}

impl Prefs {
    /// Load preferences. A missing file yields defaults; an unreadable or
    /// corrupt one is logged and also yields defaults.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to read preferences");
                return Self::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, path = %path.display(), "ignoring corrupt preferences");
            Self::default()
        })
    }

    /// Write preferences, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), PrefsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Prefs::load(&dir.path().join("nope.json")), Prefs::default());
    }

    #[test]
    fn save_then_load_keeps_dark_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        Prefs { dark_mode: true }.save(&path).unwrap();
        assert!(Prefs::load(&path).dark_mode);
    }

    #[test]
    fn corrupt_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Prefs::load(&path), Prefs::default());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"dark_mode": true, "font": "mono"}"#).unwrap();
        assert!(Prefs::load(&path).dark_mode);
    }
}
