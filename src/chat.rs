// src/chat.rs
//
// Conversation session lifecycle: owns the message list, the streaming
// draft and the loading flag, persists through the session store, and
// drives one streaming response at a time. The session handle lives
// here and is passed explicitly; there is no module-global chat id.

use crate::api::CortexClient;
use crate::errors::CortexResult;
use crate::models::{AttachedFile, Message};
use crate::session::SessionStore;
use crate::stream::{StreamDelta, StreamParser};
use futures::StreamExt;
use tokio::sync::mpsc;

/// State-change notifications applied on the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateDelta {
    DraftUpdated(String),
    MessageAppended(Message),
    /// Server-side history arrived after the startup fetch.
    HistoryLoaded(Vec<Message>),
    /// Server-initiated reset; clears local and remote state.
    SessionCleared,
    /// The in-flight response ended, successfully or not.
    StreamFinished,
}

pub struct ChatSession {
    pub session_id: String,
    pub messages: Vec<Message>,
    pub draft: String,
    pub loading: bool,
    store: SessionStore,
    client: CortexClient,
    delta_tx: mpsc::Sender<StateDelta>,
}

impl ChatSession {
    /// Opens the session: reads (or mints) the id and shows the local
    /// snapshot immediately. Call `spawn_history_fetch` afterwards to
    /// refresh from the server without blocking the UI.
    pub fn new(
        store: SessionStore,
        client: CortexClient,
        delta_tx: mpsc::Sender<StateDelta>,
    ) -> Self {
        let session_id = store.get_or_create_session_id();
        let messages = store.load_history();

        ChatSession {
            session_id,
            messages,
            draft: String::new(),
            loading: false,
            store,
            client,
            delta_tx,
        }
    }

    /// Fetches server-side history in the background. Failures are
    /// silent; the local snapshot simply stays.
    pub fn spawn_history_fetch(&self) {
        let client = self.client.clone();
        let chat_id = self.session_id.clone();
        let tx = self.delta_tx.clone();

        tokio::spawn(async move {
            match client.fetch_history(&chat_id).await {
                Ok(messages) if !messages.is_empty() => {
                    let _ = tx.send(StateDelta::HistoryLoaded(messages)).await;
                }
                Ok(_) => {}
                Err(e) => log::info!("history fetch skipped: {}", e),
            }
        });
    }

    /// Hands a composed message off to the service. Returns false
    /// without side effects when the submission is empty or when a
    /// response is already streaming (single in-flight guard).
    pub fn submit(&mut self, text: String, files: Vec<AttachedFile>, sender: &str) -> bool {
        if text.trim().is_empty() && files.is_empty() {
            return false;
        }

        if self.loading {
            log::info!("submission rejected: a response is already streaming");
            return false;
        }

        self.messages.push(Message::user(text.clone(), files));
        self.store.save_history(&self.messages);
        self.loading = true;
        self.draft.clear();

        let client = self.client.clone();
        let chat_id = self.session_id.clone();
        let sender = sender.to_string();
        let tx = self.delta_tx.clone();

        tokio::spawn(async move {
            stream_response(client, chat_id, text, sender, tx).await;
        });

        true
    }

    /// Applies one delta to in-memory and persisted state.
    pub async fn apply(&mut self, delta: StateDelta) {
        match delta {
            StateDelta::DraftUpdated(draft) => {
                self.draft = draft;
            }
            StateDelta::MessageAppended(message) => {
                self.draft.clear();
                self.messages.push(message);
                self.store.save_history(&self.messages);
            }
            StateDelta::HistoryLoaded(messages) => {
                // The server copy wins over the local snapshot, as long
                // as the user has not already moved on in this session.
                if !self.loading {
                    self.messages = messages;
                    self.store.save_history(&self.messages);
                }
            }
            StateDelta::SessionCleared => {
                self.clear().await;
            }
            StateDelta::StreamFinished => {
                self.loading = false;
                self.draft.clear();
            }
        }
    }

    /// The clear action: best-effort remote delete, then local wipe and
    /// id rotation.
    pub async fn clear(&mut self) {
        if let Err(e) = self.client.delete_history(&self.session_id).await {
            log::warn!("remote history delete failed: {}", e);
        }

        self.messages.clear();
        self.draft.clear();
        self.session_id = self.store.clear();
    }
}

/// Drives one streaming response to completion, forwarding deltas over
/// the channel. Always ends with `StreamFinished`, whatever happened.
async fn stream_response(
    client: CortexClient,
    chat_id: String,
    text: String,
    sender: String,
    tx: mpsc::Sender<StateDelta>,
) {
    let mut parser = StreamParser::new();

    if let Err(e) = drive_stream(&client, &chat_id, &text, &sender, &mut parser, &tx).await {
        log::warn!("streaming request failed: {}", e);
        forward(parser.fail(), &tx).await;
    }

    let _ = tx.send(StateDelta::StreamFinished).await;
}

async fn drive_stream(
    client: &CortexClient,
    chat_id: &str,
    text: &str,
    sender: &str,
    parser: &mut StreamParser,
    tx: &mpsc::Sender<StateDelta>,
) -> CortexResult<()> {
    let response = client.send_message(text, sender, chat_id).await?;

    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let bytes = chunk?;
        for delta in parser.push_chunk(&bytes) {
            forward(delta, tx).await;
        }
        if parser.is_finished() {
            return Ok(());
        }
    }

    for delta in parser.finish() {
        forward(delta, tx).await;
    }

    Ok(())
}

async fn forward(delta: StreamDelta, tx: &mpsc::Sender<StateDelta>) {
    let mapped = match delta {
        StreamDelta::Draft(draft) => StateDelta::DraftUpdated(draft),
        StreamDelta::Completed(message) => StateDelta::MessageAppended(message),
        StreamDelta::Reset => StateDelta::SessionCleared,
    };
    let _ = tx.send(mapped).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::stream::ERROR_REPLY;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn session_with(
        base_url: String,
        dir: &std::path::Path,
    ) -> (ChatSession, mpsc::Receiver<StateDelta>) {
        let (tx, rx) = mpsc::channel(64);
        let store = SessionStore::open(dir.to_path_buf());
        let session = ChatSession::new(store, CortexClient::new(base_url), tx);
        (session, rx)
    }

    #[tokio::test]
    async fn test_empty_submission_is_a_noop() {
        let dir = tempdir().unwrap();
        let (mut session, _rx) = session_with("http://127.0.0.1:1".to_string(), dir.path());

        assert!(!session.submit("   ".to_string(), Vec::new(), "User"));
        assert!(session.messages.is_empty());
        assert!(!session.loading);
    }

    #[tokio::test]
    async fn test_attachment_only_submission_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cortex"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("data: {\"type\":\"done\"}\n", "text/event-stream"),
            )
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let (mut session, _rx) = session_with(server.uri(), dir.path());

        let file = AttachedFile {
            name: "notes.txt".to_string(),
            path: "notes.txt".into(),
        };
        assert!(session.submit(String::new(), vec![file], "User"));
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].files.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_rejected_while_streaming() {
        let dir = tempdir().unwrap();
        let (mut session, _rx) = session_with("http://127.0.0.1:1".to_string(), dir.path());

        session.loading = true;
        assert!(!session.submit("hello".to_string(), Vec::new(), "User"));
        assert!(session.messages.is_empty());
    }

    #[tokio::test]
    async fn test_full_streaming_round_trip() {
        let server = MockServer::start().await;

        let stream_body = concat!(
            "data: {\"type\":\"token\",\"content\":\"Hel\"}\n",
            "data: {\"type\":\"token\",\"content\":\"lo\"}\n",
            "data: {\"type\":\"done\"}\n",
        );
        Mock::given(method("POST"))
            .and(path("/cortex"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(stream_body, "text/event-stream"))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let (mut session, mut rx) = session_with(server.uri(), dir.path());

        assert!(session.submit("say hello".to_string(), Vec::new(), "User"));

        // Drain deltas until the stream signals completion.
        loop {
            let delta = rx.recv().await.expect("delta channel closed early");
            let finished = delta == StateDelta::StreamFinished;
            session.apply(delta).await;
            if finished {
                break;
            }
        }

        assert!(!session.loading);
        assert_eq!(session.draft, "");
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].role, Role::User);
        assert_eq!(session.messages[1].role, Role::Assistant);
        assert_eq!(session.messages[1].content, "Hello");

        // Write-through: the stored snapshot matches in-memory state.
        let store = SessionStore::open(dir.path().to_path_buf());
        assert_eq!(store.load_history(), session.messages);
    }

    #[tokio::test]
    async fn test_transport_failure_yields_fixed_reply() {
        let dir = tempdir().unwrap();
        // Nothing listens here; the request is rejected outright.
        let (mut session, mut rx) = session_with("http://127.0.0.1:1".to_string(), dir.path());

        assert!(session.submit("hello".to_string(), Vec::new(), "User"));

        loop {
            let delta = rx.recv().await.expect("delta channel closed early");
            let finished = delta == StateDelta::StreamFinished;
            session.apply(delta).await;
            if finished {
                break;
            }
        }

        assert!(!session.loading);
        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].content, ERROR_REPLY);
        assert!(!session.messages[1].is_markdown);
    }

    #[tokio::test]
    async fn test_server_reset_clears_session_and_rotates_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/cortex"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("data: {\"type\":\"reset\"}\n", "text/event-stream"),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let (mut session, mut rx) = session_with(server.uri(), dir.path());
        let old_id = session.session_id.clone();

        assert!(session.submit("reset please".to_string(), Vec::new(), "User"));

        loop {
            let delta = rx.recv().await.expect("delta channel closed early");
            let finished = delta == StateDelta::StreamFinished;
            session.apply(delta).await;
            if finished {
                break;
            }
        }

        assert!(session.messages.is_empty());
        assert_ne!(session.session_id, old_id);
    }

    #[tokio::test]
    async fn test_history_loaded_replaces_local_snapshot() {
        let dir = tempdir().unwrap();
        let (mut session, _rx) = session_with("http://127.0.0.1:1".to_string(), dir.path());

        session
            .apply(StateDelta::HistoryLoaded(vec![
                Message::user("old question", Vec::new()),
                Message::assistant("old answer", true),
            ]))
            .await;

        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[1].content, "old answer");
    }
}
