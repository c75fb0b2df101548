//! Local session storage
//!
//! A small JSON key/value file that plays the role browser local storage
//! plays for a web dApp. Only the active account id is persisted, so that a
//! wallet session can be resumed on the next start.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStore {
    entries: HashMap<String, String>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    storage_path: PathBuf,
}

impl SessionStore {
    /// Create an empty store; nothing is written until the first change.
    pub fn new(storage_path: PathBuf) -> Self {
        Self {
            entries: HashMap::new(),
            updated_at: Utc::now(),
            storage_path,
        }
    }

    /// Load the store from disk, or start an empty one if the file does not exist yet.
    pub fn load_or_create(storage_path: PathBuf) -> Result<Self> {
        if !storage_path.exists() {
            return Ok(Self::new(storage_path));
        }

        let content = std::fs::read_to_string(&storage_path)
            .context("Failed to read session storage file")?;
        let mut store: SessionStore =
            serde_json::from_str(&content).context("Failed to parse session storage")?;
        store.storage_path = storage_path;
        Ok(store)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.save()
    }

    /// Remove a key. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    pub fn save(&mut self) -> Result<()> {
        self.updated_at = Utc::now();
        save_session_store(&self.storage_path, self)
    }
}

/// Get the default path for the session storage file.
///
/// On Linux: ~/.local/share/hedera-agent-chat/local_storage.json
/// On macOS: ~/Library/Application Support/hedera-agent-chat/local_storage.json
/// On Windows: %LOCALAPPDATA%\hedera-agent-chat\local_storage.json
pub fn default_storage_path() -> Result<PathBuf> {
    let mut path = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?;
    path.push("hedera-agent-chat");
    path.push("local_storage.json");
    Ok(path)
}

fn save_session_store(file_path: &Path, store: &SessionStore) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create session storage directory")?;
    }

    // Write to a temp file, then rename into place
    let temp_path = file_path.with_extension("tmp");
    let content =
        serde_json::to_string_pretty(store).context("Failed to serialize session storage")?;
    std::fs::write(&temp_path, content).context("Failed to write session storage file")?;

    std::fs::rename(&temp_path, file_path)
        .or_else(|_| {
            // If rename fails (e.g., cross-device), try copy + remove
            std::fs::copy(&temp_path, file_path)?;
            std::fs::remove_file(&temp_path)?;
            Ok::<(), std::io::Error>(())
        })
        .context("Failed to finalize session storage file")?;

    Ok(())
}
