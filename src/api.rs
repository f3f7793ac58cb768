// src/api.rs

use crate::errors::{CortexError, CortexResult};
use crate::models::Message;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct SendBody<'a> {
    message: &'a str,
    sender: &'a str,
    #[serde(rename = "chatId")]
    chat_id: &'a str,
}

/// Server-side history is stored as `{You, Cortex}` exchange pairs.
#[derive(Debug, Deserialize)]
struct HistoryPair {
    #[serde(rename = "You")]
    you: String,
    #[serde(rename = "Cortex")]
    cortex: String,
}

#[derive(Debug, Deserialize)]
struct HistoryEnvelope {
    #[serde(default)]
    messages: Vec<HistoryPair>,
}

/// HTTP client for the Cortex chat service. No request timeout and no
/// retries; an unresponsive server leaves a request pending and a
/// failed send requires the user to resubmit.
#[derive(Debug, Clone)]
pub struct CortexClient {
    http: Client,
    base_url: String,
}

impl CortexClient {
    pub fn new(base_url: String) -> Self {
        CortexClient {
            http: Client::new(),
            base_url,
        }
    }

    /// Posts a user message and returns the response whose body is the
    /// token stream. The caller drives the stream through a
    /// `StreamParser`.
    pub async fn send_message(
        &self,
        message: &str,
        sender: &str,
        chat_id: &str,
    ) -> CortexResult<reqwest::Response> {
        let body = SendBody {
            message,
            sender,
            chat_id,
        };

        let response = self
            .http
            .post(format!("{}/cortex", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CortexError::api_error(format!(
                "chat endpoint returned {}",
                status
            )));
        }

        Ok(response)
    }

    /// Fetches the server-side history for a session. Each stored pair
    /// expands to one user message and one Markdown assistant message.
    pub async fn fetch_history(&self, chat_id: &str) -> CortexResult<Vec<Message>> {
        let response = self
            .http
            .get(format!("{}/cortex/chat/history/{}", self.base_url, chat_id))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CortexError::api_error(format!(
                "history endpoint returned {}",
                status
            )));
        }

        let envelope: HistoryEnvelope = response.json().await?;

        let mut messages = Vec::with_capacity(envelope.messages.len() * 2);
        for pair in envelope.messages {
            messages.push(Message::user(pair.you, Vec::new()));
            messages.push(Message::assistant(pair.cortex, true));
        }

        Ok(messages)
    }

    /// Deletes the server-side history for a session.
    pub async fn delete_history(&self, chat_id: &str) -> CortexResult<()> {
        let response = self
            .http
            .delete(format!("{}/cortex/chat/history/{}", self.base_url, chat_id))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CortexError::api_error(format!(
                "history delete returned {}",
                status
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::stream::{StreamDelta, StreamParser};
    use futures::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_history_expands_pairs() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/cortex/chat/history/chat_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [
                    { "You": "hi", "Cortex": "hello **there**" },
                    { "You": "thanks", "Cortex": "any time" }
                ]
            })))
            .mount(&server)
            .await;

        let client = CortexClient::new(server.uri());
        let messages = client.fetch_history("chat_1").await.unwrap();

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "hi");
        assert!(!messages[0].is_markdown);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "hello **there**");
        assert!(messages[1].is_markdown);
        assert_eq!(messages[3].content, "any time");
    }

    #[tokio::test]
    async fn test_fetch_history_empty_envelope() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/cortex/chat/history/chat_2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = CortexClient::new(server.uri());
        assert!(client.fetch_history("chat_2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_history_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/cortex/chat/history/chat_3"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = CortexClient::new(server.uri());
        assert!(client.fetch_history("chat_3").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_history() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/cortex/chat/history/chat_4"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = CortexClient::new(server.uri());
        client.delete_history("chat_4").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_message_streams_tokens() {
        let server = MockServer::start().await;

        let stream_body = concat!(
            "data: {\"type\":\"token\",\"content\":\"Hel\"}\n",
            "data: {\"type\":\"token\",\"content\":\"lo\"}\n",
            "data: {\"type\":\"done\"}\n",
        );

        Mock::given(method("POST"))
            .and(path("/cortex"))
            .and(body_json(json!({
                "message": "say hello",
                "sender": "User",
                "chatId": "chat_5"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(stream_body, "text/event-stream"))
            .mount(&server)
            .await;

        let client = CortexClient::new(server.uri());
        let response = client
            .send_message("say hello", "User", "chat_5")
            .await
            .unwrap();

        let mut parser = StreamParser::new();
        let mut deltas = Vec::new();
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            deltas.extend(parser.push_chunk(&chunk.unwrap()));
            if parser.is_finished() {
                break;
            }
        }

        let StreamDelta::Completed(message) = deltas.last().unwrap() else {
            panic!("expected a completed message");
        };
        assert_eq!(message.content, "Hello");
    }

    #[tokio::test]
    async fn test_send_message_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/cortex"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = CortexClient::new(server.uri());
        assert!(client.send_message("x", "User", "chat_6").await.is_err());
    }
}
