//! Streaming chat backend.
//!
//! Serves a model list and a chat endpoint that relays either a local mock
//! generator or an OpenAI-compatible upstream as Server-Sent Events.

pub mod cli;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod providers;
