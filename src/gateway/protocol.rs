use crate::models::ResolvedModel;
use crate::providers::ChatMessage;

use axum::response::sse::Event;
use serde::{Deserialize, Serialize};

// ============================================================================
// HTTP Bodies
// ============================================================================

/// Body of `POST /api/chat/stream`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Accepted for client compatibility; responses always stream.
    #[serde(default = "default_stream")]
    pub stream: bool,
}

fn default_stream() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

// ============================================================================
// Relay Events
// ============================================================================
//
// Every relay response is `meta`, then any number of `delta`s, then at most
// one `error`, then exactly one `done`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    Meta(ResolvedModel),
    Delta { text: String },
    Error { message: String },
    Done,
}

impl RelayEvent {
    pub fn delta(text: impl Into<String>) -> Self {
        RelayEvent::Delta { text: text.into() }
    }

    pub fn error(message: impl ToString) -> Self {
        RelayEvent::Error {
            message: message.to_string(),
        }
    }

    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            RelayEvent::Meta(_) => "meta",
            RelayEvent::Delta { .. } => "delta",
            RelayEvent::Error { .. } => "error",
            RelayEvent::Done => "done",
        }
    }

    /// JSON payload carried in the `data:` field.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            RelayEvent::Meta(route) => serde_json::json!(route),
            RelayEvent::Delta { text } => serde_json::json!({ "text": text }),
            RelayEvent::Error { message } => serde_json::json!({ "message": message }),
            RelayEvent::Done => serde_json::json!({}),
        }
    }

    /// Wire form: `event: <name>\ndata: <json>\n\n`.
    pub fn encode(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.name(), self.payload())
    }

    pub fn into_sse_event(self) -> Event {
        Event::default()
            .event(self.name())
            .data(self.payload().to_string())
    }
}
