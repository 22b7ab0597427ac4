//! Client-side session persistence.
//!
//! The SPA keeps the issued token and a summary of the logged-in user on
//! disk so a restart can restore the authenticated state without another
//! login. This module is the storage half of that: load/save/clear over a
//! JSON file, decoupled from whatever renders the session.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientSession {
    pub token: String,
    pub user: SessionUser,
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A missing or unreadable session file is simply "not logged in";
    /// only I/O on an existing file surfaces as an error.
    pub fn load(&self) -> Result<Option<ClientSession>, String> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(format!("Failed to read session file: {e}")),
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!("Discarding corrupt session file: {e}");
                Ok(None)
            }
        }
    }

    pub fn save(&self, session: &ClientSession) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create session directory: {e}"))?;
        }
        let raw = serde_json::to_string_pretty(session)
            .map_err(|e| format!("Failed to serialize session: {e}"))?;
        std::fs::write(&self.path, raw).map_err(|e| format!("Failed to write session file: {e}"))
    }

    pub fn clear(&self) -> Result<(), String> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("Failed to remove session file: {e}")),
        }
    }
}
