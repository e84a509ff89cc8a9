//! Local provider that fakes a streamed reply without any network access.
//!
//! The reply echoes the most recent user message back inside a fixed
//! template and is emitted one character at a time, which is enough to
//! exercise a streaming frontend end to end.

use super::{ChatMessage, ModelProvider, ProviderError, Role, StreamEvent, STREAM_BUFFER};
use crate::config::DEFAULT_MOCK_CHAR_DELAY_MS;

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

pub struct MockProvider {
    delay: Duration,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::with_delay(Duration::from_millis(DEFAULT_MOCK_CHAR_DELAY_MS))
    }

    /// Use `delay` as the pause before each emitted character.
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Content of the last user message, or `""` when there is none.
fn last_user_text(messages: &[ChatMessage]) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

/// The full reply the mock provider streams for `model` and `messages`.
pub fn mock_reply(model: &str, messages: &[ChatMessage]) -> String {
    format!(
        "(Mock stream) You selected model {model}.\nYou said: {}\n\nOnce a real model is connected, this will become real output.",
        last_user_text(messages)
    )
}

#[async_trait]
impl ModelProvider for MockProvider {
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<mpsc::Receiver<StreamEvent>, ProviderError> {
        let reply = mock_reply(model, messages);
        let delay = self.delay;
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);

        tokio::spawn(async move {
            for ch in reply.chars() {
                tokio::time::sleep(delay).await;
                if tx.send(StreamEvent::Delta(ch.to_string())).await.is_err() {
                    debug!("mock stream receiver dropped, stopping");
                    return;
                }
            }
            let _ = tx.send(StreamEvent::Done).await;
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        super::MOCK_PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[test]
    fn picks_most_recent_user_message() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("first"),
            ChatMessage::assistant("reply"),
            ChatMessage::user("second"),
            ChatMessage::assistant("another reply"),
        ];
        assert_eq!(last_user_text(&messages), "second");
    }

    #[test]
    fn no_user_message_means_empty_echo() {
        let messages = vec![ChatMessage::system("only system")];
        assert_eq!(last_user_text(&messages), "");
        assert!(mock_reply("mock-1", &messages).contains("You said: \n"));
    }

    #[test]
    fn reply_embeds_model_and_user_text() {
        let reply = mock_reply("mock-1", &[ChatMessage::user("hello")]);
        assert_eq!(
            reply,
            "(Mock stream) You selected model mock-1.\nYou said: hello\n\nOnce a real model is connected, this will become real output."
        );
    }

    #[tokio::test]
    async fn streams_one_character_per_delta() {
        let provider = MockProvider::with_delay(Duration::ZERO);
        let messages = vec![ChatMessage::user("héllo 世界")];
        let rx = provider.stream_chat("mock-1", &messages).await.unwrap();
        let events = collect(rx).await;

        assert_eq!(events.last(), Some(&StreamEvent::Done));
        let mut text = String::new();
        for event in &events[..events.len() - 1] {
            match event {
                StreamEvent::Delta(chunk) => {
                    assert_eq!(chunk.chars().count(), 1);
                    text.push_str(chunk);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(text, mock_reply("mock-1", &messages));
    }

    #[test]
    fn default_delay_is_ten_millis() {
        assert_eq!(MockProvider::default().delay(), Duration::from_millis(10));
    }
}
