// src/session.rs
//
// File-backed session store. Two flat entries, mirroring the two keys
// the service's web client keeps in browser storage: the session id and
// the serialized message history. This is a best-effort local cache,
// not the source of truth, so every read failure degrades to "empty"
// and every write failure is logged and swallowed.

use crate::models::Message;
use chrono::Utc;
use rand::{distr::Alphanumeric, Rng};
use std::fs;
use std::path::PathBuf;

const SESSION_ID_FILE: &str = "session_id";
const MESSAGES_FILE: &str = "messages.json";

#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn open(dir: PathBuf) -> Self {
        if let Err(e) = fs::create_dir_all(&dir) {
            log::warn!("could not create session dir {}: {}", dir.display(), e);
        }
        SessionStore { dir }
    }

    /// Returns the persisted session id, generating and persisting a
    /// fresh one if none is stored.
    pub fn get_or_create_session_id(&self) -> String {
        let path = self.dir.join(SESSION_ID_FILE);

        if let Ok(stored) = fs::read_to_string(&path) {
            let stored = stored.trim();
            if !stored.is_empty() {
                return stored.to_string();
            }
        }

        let id = generate_session_id();
        if let Err(e) = fs::write(&path, &id) {
            log::warn!("could not persist session id: {}", e);
        }
        id
    }

    /// Loads the stored message snapshot. Any read or decode failure
    /// yields an empty history.
    pub fn load_history(&self) -> Vec<Message> {
        let path = self.dir.join(MESSAGES_FILE);

        match fs::read_to_string(&path) {
            Ok(json_str) => match serde_json::from_str(&json_str) {
                Ok(messages) => messages,
                Err(e) => {
                    log::warn!("stored history is unreadable, starting empty: {}", e);
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        }
    }

    /// Overwrites the stored snapshot with the full message list.
    /// No partial writes; the snapshot is always prefix-consistent
    /// with in-memory state because this runs on every append.
    pub fn save_history(&self, messages: &[Message]) {
        let json_str = match serde_json::to_string_pretty(messages) {
            Ok(s) => s,
            Err(e) => {
                log::warn!("could not serialize history: {}", e);
                return;
            }
        };

        if let Err(e) = fs::write(self.dir.join(MESSAGES_FILE), json_str) {
            log::warn!("could not save history: {}", e);
        }
    }

    /// Drops the stored history and rotates to a new session id, which
    /// is persisted and returned. Ids are never reused after a clear.
    pub fn clear(&self) -> String {
        if let Err(e) = fs::remove_file(self.dir.join(MESSAGES_FILE)) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("could not remove stored history: {}", e);
            }
        }

        let id = generate_session_id();
        if let Err(e) = fs::write(self.dir.join(SESSION_ID_FILE), &id) {
            log::warn!("could not persist rotated session id: {}", e);
        }
        id
    }
}

/// Timestamp plus a random suffix. Collision probability is negligible
/// for one client; this is not a cryptographic guarantee.
fn generate_session_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(9)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();

    format!("chat_{}_{}", Utc::now().timestamp_millis(), suffix)
}
