// src/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A file the user attached to an outgoing message. Only the name and
/// the local path are carried; the bytes stay on disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedFile {
    pub name: String,
    pub path: PathBuf,
}

impl AttachedFile {
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        AttachedFile { name, path }
    }
}

/// One entry in the conversation. Immutable once appended; the message
/// list only ever grows, except for a full clear.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<AttachedFile>,
    pub is_markdown: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>, files: Vec<AttachedFile>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
            files,
            is_markdown: false,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>, is_markdown: bool) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
            files: Vec::new(),
            is_markdown,
            timestamp: Utc::now(),
        }
    }
}
