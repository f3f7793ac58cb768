// src/composer.rs
//
// The input bar: free text plus attached files. Enter submits,
// Shift+Enter inserts a literal newline. Attachments are managed with
// slash commands, the terminal stand-in for a file picker:
//   /attach <path>   attach a file
//   /detach <n>      drop attachment n (1-based)
//   /clear           clear the whole conversation

use crate::models::AttachedFile;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;

/// What a handled key resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposerAction {
    Submit {
        text: String,
        files: Vec<AttachedFile>,
    },
    ClearChat,
}

#[derive(Debug, Default)]
pub struct Composer {
    input: String,
    attached: Vec<AttachedFile>,
    /// One-line feedback shown under the input (bad path, detached file).
    note: Option<String>,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn attached(&self) -> &[AttachedFile] {
        &self.attached
    }

    pub fn take_note(&mut self) -> Option<String> {
        self.note.take()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty() && self.attached.is_empty()
    }

    /// Submission is enabled only with trimmed-non-empty text or at
    /// least one attachment.
    pub fn can_submit(&self) -> bool {
        !self.input.trim().is_empty() || !self.attached.is_empty()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ComposerAction> {
        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.input.push('\n');
                    None
                } else {
                    self.handle_enter()
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
                None
            }
            KeyCode::Char(c) => {
                if !key.modifiers.contains(KeyModifiers::CONTROL) {
                    self.input.push(c);
                }
                None
            }
            _ => None,
        }
    }

    fn handle_enter(&mut self) -> Option<ComposerAction> {
        let line = self.input.trim().to_string();

        if let Some(path) = line.strip_prefix("/attach ") {
            self.attach(path.trim());
            self.input.clear();
            return None;
        }

        if let Some(index) = line.strip_prefix("/detach ") {
            self.detach(index.trim());
            self.input.clear();
            return None;
        }

        if line == "/clear" {
            self.input.clear();
            return Some(ComposerAction::ClearChat);
        }

        if !self.can_submit() {
            return None;
        }

        let text = std::mem::take(&mut self.input);
        let files = std::mem::take(&mut self.attached);
        Some(ComposerAction::Submit { text, files })
    }

    fn attach(&mut self, raw_path: &str) {
        if raw_path.is_empty() {
            self.note = Some("usage: /attach <path>".to_string());
            return;
        }

        let path = PathBuf::from(raw_path);
        if !path.is_file() {
            self.note = Some(format!("no such file: {}", raw_path));
            return;
        }

        let file = AttachedFile::from_path(path);
        self.note = Some(format!("attached {}", file.name));
        self.attached.push(file);
    }

    fn detach(&mut self, raw_index: &str) {
        match raw_index.parse::<usize>() {
            Ok(n) if n >= 1 && n <= self.attached.len() => {
                let removed = self.attached.remove(n - 1);
                self.note = Some(format!("detached {}", removed.name));
            }
            _ => {
                self.note = Some(format!(
                    "usage: /detach <1..{}>",
                    self.attached.len().max(1)
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;
    use std::io::Write;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(composer: &mut Composer, text: &str) {
        for c in text.chars() {
            composer.handle_key(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_enter_on_empty_input_is_a_noop() {
        let mut composer = Composer::new();
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), None);

        type_text(&mut composer, "   ");
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), None);
        assert!(!composer.can_submit());
    }

    #[test]
    fn test_enter_submits_and_clears() {
        let mut composer = Composer::new();
        type_text(&mut composer, "hello there");

        let action = composer.handle_key(press(KeyCode::Enter));
        assert_eq!(
            action,
            Some(ComposerAction::Submit {
                text: "hello there".to_string(),
                files: Vec::new(),
            })
        );
        assert!(composer.is_empty());
    }

    #[test]
    fn test_shift_enter_inserts_newline() {
        let mut composer = Composer::new();
        type_text(&mut composer, "line one");

        let action = composer.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        assert_eq!(action, None);

        type_text(&mut composer, "line two");
        assert_eq!(composer.input(), "line one\nline two");
    }

    #[test]
    fn test_attach_and_detach() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "contents").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let mut composer = Composer::new();
        type_text(&mut composer, &format!("/attach {}", path));
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), None);
        assert_eq!(composer.attached().len(), 1);
        assert!(composer.can_submit());

        type_text(&mut composer, "/detach 1");
        assert_eq!(composer.handle_key(press(KeyCode::Enter)), None);
        assert!(composer.attached().is_empty());
        assert!(!composer.can_submit());
    }

    #[test]
    fn test_attach_missing_file_is_rejected() {
        let mut composer = Composer::new();
        type_text(&mut composer, "/attach /no/such/file.txt");
        composer.handle_key(press(KeyCode::Enter));

        assert!(composer.attached().is_empty());
        assert!(composer.take_note().unwrap().starts_with("no such file"));
    }

    #[test]
    fn test_attachment_only_submission() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let mut composer = Composer::new();
        type_text(&mut composer, &format!("/attach {}", path));
        composer.handle_key(press(KeyCode::Enter));

        let action = composer.handle_key(press(KeyCode::Enter));
        match action {
            Some(ComposerAction::Submit { text, files }) => {
                assert!(text.is_empty());
                assert_eq!(files.len(), 1);
            }
            other => panic!("expected Submit, got {:?}", other),
        }
    }

    #[test]
    fn test_clear_command() {
        let mut composer = Composer::new();
        type_text(&mut composer, "/clear");

        assert_eq!(
            composer.handle_key(press(KeyCode::Enter)),
            Some(ComposerAction::ClearChat)
        );
        assert!(composer.is_empty());
    }
}
