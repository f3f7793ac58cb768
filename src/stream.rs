// src/stream.rs
//
// Incremental parser for the server's token stream. The response body
// is line-oriented UTF-8: each logical unit is `data: <json>\n`, but
// network chunk boundaries are arbitrary and do not respect line
// boundaries, so partial lines are buffered and only parsed once a
// terminator arrives.

use crate::models::Message;
use serde::Deserialize;

pub const DATA_PREFIX: &str = "data: ";

/// The fixed reply shown for any failure, server-signaled or transport.
pub const ERROR_REPLY: &str = "❌ Sorry, I encountered an error. Please try again.";

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamPayload {
    Token {
        content: String,
    },
    Image {
        url: String,
    },
    Done,
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    Reset,
}

/// A discrete state change produced while consuming the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamDelta {
    /// The accumulated draft text grew; carries the full draft so far.
    Draft(String),
    /// The response finished (done or error); carries the message to
    /// append to the conversation.
    Completed(Message),
    /// The server asked for a full session reset.
    Reset,
}

/// Reduces raw byte chunks into `StreamDelta`s. One parser per
/// response; after a terminal payload it is finished and ignores all
/// further input.
#[derive(Debug, Default)]
pub struct StreamParser {
    /// Raw bytes; a chunk boundary may fall inside a multibyte
    /// character, so decoding waits for a complete line.
    line_buf: Vec<u8>,
    draft: String,
    image_url: Option<String>,
    finished: bool,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Feeds one network chunk, returning the deltas completed lines
    /// produced. An unterminated trailing line stays buffered until the
    /// next chunk (or `finish`).
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<StreamDelta> {
        let mut out = Vec::new();
        if self.finished {
            return out;
        }

        self.line_buf.extend_from_slice(chunk);

        while let Some(newline) = self.line_buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.line_buf.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            self.apply_line(line.trim_end_matches(['\r', '\n']), &mut out);
            if self.finished {
                break;
            }
        }

        out
    }

    /// Flushes a trailing unterminated line at end of stream.
    pub fn finish(&mut self) -> Vec<StreamDelta> {
        let mut out = Vec::new();
        if self.finished || self.line_buf.is_empty() {
            return out;
        }

        let line = std::mem::take(&mut self.line_buf);
        let line = String::from_utf8_lossy(&line);
        self.apply_line(line.trim_end_matches(['\r', '\n']), &mut out);
        out
    }

    /// Marks the stream as failed (transport-level), clearing the draft
    /// and producing the fixed failure message.
    pub fn fail(&mut self) -> StreamDelta {
        self.draft.clear();
        self.line_buf.clear();
        self.finished = true;
        StreamDelta::Completed(Message::assistant(ERROR_REPLY, false))
    }

    fn apply_line(&mut self, line: &str, out: &mut Vec<StreamDelta>) {
        let Some(data) = line.strip_prefix(DATA_PREFIX) else {
            return;
        };

        // Malformed payloads are skipped; they do not abort the stream.
        let payload: StreamPayload = match serde_json::from_str(data) {
            Ok(payload) => payload,
            Err(e) => {
                log::debug!("skipping malformed stream line: {}", e);
                return;
            }
        };

        match payload {
            StreamPayload::Token { content } => {
                self.draft.push_str(&content);
                out.push(StreamDelta::Draft(self.draft.clone()));
            }
            StreamPayload::Image { url } => {
                // Remembered, folded into the final content on `done`.
                self.image_url = Some(url);
            }
            StreamPayload::Done => {
                let content = match self.image_url.take() {
                    Some(url) => {
                        format!("{}\n\n![Generated Image]({})", self.draft, url)
                    }
                    None => self.draft.clone(),
                };
                self.draft.clear();
                self.finished = true;
                out.push(StreamDelta::Completed(Message::assistant(content, true)));
            }
            StreamPayload::Error { message } => {
                if let Some(detail) = message {
                    log::warn!("server-signaled stream error: {}", detail);
                }
                self.draft.clear();
                self.finished = true;
                out.push(StreamDelta::Completed(Message::assistant(ERROR_REPLY, false)));
            }
            StreamPayload::Reset => {
                self.draft.clear();
                self.finished = true;
                out.push(StreamDelta::Reset);
            }
        }
    }
}
