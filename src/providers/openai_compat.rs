//! Pass-through provider for OpenAI-compatible chat completions APIs.
//!
//! Posts `{model, messages, stream: true}` to `{base_url}/v1/chat/completions`
//! and re-emits the `choices[0].delta.content` fragments of the upstream
//! SSE stream as they arrive.

use super::{ChatMessage, ModelProvider, ProviderError, StreamEvent, STREAM_BUFFER};
use crate::config::OpenAiCompatConfig;

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

// ============================================================================
// OpenAI-Compatible API Types
// ============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiStreamChunk {
    #[serde(default)]
    pub choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiStreamChoice {
    #[serde(default)]
    pub delta: Option<OpenAiStreamDelta>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiStreamDelta {
    #[serde(default)]
    pub content: Option<String>,
}

// ============================================================================
// Line Handling
// ============================================================================

/// What a single upstream line means for the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseLine {
    Skip,
    Content(String),
    Done,
}

/// Classify one line of the upstream body.
///
/// Malformed payloads are skipped, never reported.
pub(crate) fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data: ") else {
        return SseLine::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseLine::Done;
    }

    match serde_json::from_str::<OpenAiStreamChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta)
            .and_then(|delta| delta.content)
            .filter(|content| !content.is_empty())
            .map_or(SseLine::Skip, SseLine::Content),
        Err(_) => SseLine::Skip,
    }
}

/// Reassembles newline-terminated lines from arbitrary network chunks.
///
/// Bytes are kept until a full line is present so that multi-byte UTF-8
/// sequences split across chunks decode correctly.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_line(&line[..pos]));
        }
        lines
    }

    /// Whatever is left once the body ends without a final newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(decode_line(&rest))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

// ============================================================================
// Provider
// ============================================================================

pub struct OpenAiCompatProvider {
    base_url: String,
    api_key: String,
    idle_timeout: Option<Duration>,
    client: Client,
}

impl OpenAiCompatProvider {
    pub fn new(config: &OpenAiCompatConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            idle_timeout: config.idle_timeout,
            client: Client::builder().build()?,
        })
    }

    pub fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

#[async_trait]
impl ModelProvider for OpenAiCompatProvider {
    async fn stream_chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<mpsc::Receiver<StreamEvent>, ProviderError> {
        let url = self.completions_url();
        let body = OpenAiRequest {
            model,
            messages,
            stream: true,
        };
        debug!(%url, model, "opening upstream chat stream");

        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send();

        let resp = idle_bounded(self.idle_timeout, request)
            .await?
            .map_err(ProviderError::Request)?;

        if !resp.status().is_success() {
            let status = resp.status();
            // The error body is only informative; a stalled one is dropped.
            let text = match idle_bounded(self.idle_timeout, resp.text()).await {
                Ok(Ok(text)) => text,
                _ => String::new(),
            };
            warn!(%status, model, "upstream rejected chat completion");
            return Err(ProviderError::Upstream { status, body: text });
        }

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(pump_upstream(resp, tx, self.idle_timeout));
        Ok(rx)
    }

    fn name(&self) -> &str {
        super::OPENAI_COMPAT_PROVIDER
    }
}

/// Await `fut`, giving up after `idle` if one is configured.
async fn idle_bounded<F: Future>(
    idle: Option<Duration>,
    fut: F,
) -> Result<F::Output, ProviderError> {
    match idle {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ProviderError::Timeout(limit)),
        None => Ok(fut.await),
    }
}

/// Forward upstream content to `tx` until the upstream finishes, fails, or
/// the receiver goes away.
async fn pump_upstream(
    resp: reqwest::Response,
    tx: mpsc::Sender<StreamEvent>,
    idle_timeout: Option<Duration>,
) {
    let mut body = resp.bytes_stream();
    let mut lines = LineBuffer::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = tx.closed() => {
                debug!("stream receiver dropped, closing upstream connection");
                return;
            }
            next = idle_bounded(idle_timeout, body.next()) => next,
        };

        match next {
            Ok(Some(Ok(bytes))) => {
                for line in lines.push(&bytes) {
                    if forward_line(&line, &tx).await.is_break() {
                        return;
                    }
                }
            }
            Ok(Some(Err(e))) => {
                warn!("upstream stream failed: {}", e);
                let _ = tx
                    .send(StreamEvent::Error(ProviderError::Stream(e).to_string()))
                    .await;
                return;
            }
            Ok(None) => {
                if let Some(line) = lines.finish() {
                    if forward_line(&line, &tx).await.is_break() {
                        return;
                    }
                }
                let _ = tx.send(StreamEvent::Done).await;
                return;
            }
            Err(timeout) => {
                warn!("{}", timeout);
                let _ = tx.send(StreamEvent::Error(timeout.to_string())).await;
                return;
            }
        }
    }
}

async fn forward_line(line: &str, tx: &mpsc::Sender<StreamEvent>) -> ControlFlow<()> {
    match parse_sse_line(line) {
        SseLine::Skip => ControlFlow::Continue(()),
        SseLine::Content(text) => {
            if tx.send(StreamEvent::Delta(text)).await.is_err() {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }
        SseLine::Done => {
            let _ = tx.send(StreamEvent::Done).await;
            ControlFlow::Break(())
        }
    }
}
