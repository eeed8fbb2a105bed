//! Channel trait and the message types that flow through it.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use uuid::Uuid;

use crate::error::ChannelError;

/// Stream of inbound messages produced by a started channel.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A message received from a chat transport.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Name of the channel that produced the message.
    pub channel: String,
    /// Transport-level user identifier.
    pub user_id: String,
    /// Display name, when the transport provides one.
    pub user_name: Option<String>,
    pub content: String,
    /// Transport-specific routing data (e.g. Telegram `chat_id`).
    pub metadata: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(
        channel: impl Into<String>,
        user_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            user_id: user_id.into(),
            user_name: None,
            content: content.into(),
            metadata: serde_json::Value::Null,
            received_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }

    /// Chat id from the metadata, if the transport set one.
    pub fn chat_id(&self) -> Option<&str> {
        self.metadata.get("chat_id").and_then(|v| v.as_str())
    }

    /// Key of the survey session this message belongs to.
    ///
    /// One session per user per chat, so a user in a group chat and in a
    /// private chat runs two independent surveys.
    pub fn session_key(&self) -> String {
        match self.chat_id() {
            Some(chat_id) => format!("{}:{}:{}", self.channel, chat_id, self.user_id),
            None => format!("{}:{}", self.channel, self.user_id),
        }
    }
}

/// A text reply to send back on the channel a message came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingResponse {
    pub content: String,
}

impl OutgoingResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Transient progress signals. Channels may render them or ignore them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// Long-running work started (shown as "typing" on Telegram).
    Thinking(String),
}

/// A chat transport.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Start receiving messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Send one reply to the chat `msg` came from.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    async fn send_status(
        &self,
        status: StatusUpdate,
        metadata: &serde_json::Value,
    ) -> Result<(), ChannelError>;

    async fn health_check(&self) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }

    /// Longest message the transport accepts, in characters. `None` means
    /// unlimited.
    fn max_message_len(&self) -> Option<usize> {
        None
    }
}

/// Split `text` into chunks of at most `max_len` characters.
///
/// Splits fall on character boundaries only, so the chunks concatenate back
/// to `text` exactly. Empty text yields no chunks.
///
/// Length is counted in Unicode scalar values. Telegram counts UTF-16 code
/// units, so a chunk dense with astral-plane characters (most emoji) can still
/// exceed its limit.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if max_len == 0 {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        if count == max_len {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(ch);
        count += 1;
    }
    chunks.push(current);

    chunks
}

/// Send `text` as a reply to `msg`, split to the channel's length limit.
/// Chunks go out in order; the first failure stops delivery.
pub async fn deliver(
    channel: &dyn Channel,
    msg: &IncomingMessage,
    text: &str,
) -> Result<(), ChannelError> {
    let chunks = match channel.max_message_len() {
        Some(limit) => split_message(text, limit),
        None if text.is_empty() => Vec::new(),
        None => vec![text.to_string()],
    };

    if chunks.len() > 1 {
        tracing::debug!(
            channel = channel.name(),
            chunks = chunks.len(),
            chars = text.chars().count(),
            "Splitting long message"
        );
    }

    for chunk in chunks {
        channel.respond(msg, OutgoingResponse::text(chunk)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn split_short_message_is_one_chunk() {
        assert_eq!(split_message("Hello", 4096), vec!["Hello"]);
    }

    #[test]
    fn split_exact_limit_is_one_chunk() {
        let msg = "a".repeat(4096);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], msg);
    }

    #[test]
    fn split_ten_thousand_chars() {
        let msg: String = (0..10_000)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect();
        let chunks = split_message(&msg, 4096);

        let lens: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
        assert_eq!(lens, vec![4096, 4096, 1808]);
        assert_eq!(chunks.concat(), msg);
    }

    #[test]
    fn split_keeps_whitespace_at_boundaries() {
        let msg = format!("{} {}", "a".repeat(4095), "b".repeat(10));
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks[0].chars().last(), Some(' '));
        assert_eq!(chunks.concat(), msg);
    }

    #[test]
    fn split_never_cuts_multibyte_chars() {
        let msg = "привет🚀".repeat(1000);
        let chunks = split_message(&msg, 4096);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4096));
        assert_eq!(chunks.concat(), msg);
    }

    #[test]
    fn split_empty_text_has_no_chunks() {
        assert!(split_message("", 4096).is_empty());
    }

    #[test]
    fn session_key_includes_chat_when_present() {
        let msg = IncomingMessage::new("telegram", "42", "hi")
            .with_metadata(serde_json::json!({"chat_id": "-100"}));
        assert_eq!(msg.session_key(), "telegram:-100:42");

        let msg = IncomingMessage::new("cli", "local-user", "hi");
        assert_eq!(msg.session_key(), "cli:local-user");
    }

    struct Recording {
        limit: Option<usize>,
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Channel for Recording {
        fn name(&self) -> &str {
            "recording"
        }
        async fn start(&self) -> Result<MessageStream, ChannelError> {
            Ok(Box::pin(futures::stream::empty()))
        }
        async fn respond(
            &self,
            _msg: &IncomingMessage,
            response: OutgoingResponse,
        ) -> Result<(), ChannelError> {
            self.sent.lock().unwrap().push(response.content);
            Ok(())
        }
        async fn send_status(
            &self,
            _status: StatusUpdate,
            _metadata: &serde_json::Value,
        ) -> Result<(), ChannelError> {
            Ok(())
        }
        async fn health_check(&self) -> Result<(), ChannelError> {
            Ok(())
        }
        fn max_message_len(&self) -> Option<usize> {
            self.limit
        }
    }

    #[tokio::test]
    async fn deliver_sends_chunks_in_order() {
        let channel = Recording {
            limit: Some(4096),
            sent: Mutex::new(Vec::new()),
        };
        let msg = IncomingMessage::new("recording", "u", "x");
        let text = format!("{}{}{}", "a".repeat(4096), "b".repeat(4096), "c".repeat(1808));

        deliver(&channel, &msg, &text).await.unwrap();

        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert!(sent[0].chars().all(|c| c == 'a'));
        assert!(sent[1].chars().all(|c| c == 'b'));
        assert_eq!(sent[2], "c".repeat(1808));
    }

    #[tokio::test]
    async fn deliver_without_limit_sends_whole_text() {
        let channel = Recording {
            limit: None,
            sent: Mutex::new(Vec::new()),
        };
        let msg = IncomingMessage::new("recording", "u", "x");
        deliver(&channel, &msg, &"z".repeat(10_000)).await.unwrap();
        assert_eq!(channel.sent.lock().unwrap().len(), 1);
    }
}
