use crate::gateway::chat::relay_chat;
use crate::gateway::protocol::*;
use crate::gateway::server::GatewayState;
use crate::models::ModelItem;

use axum::{
    extract::{Json, State},
    http::HeaderValue,
    response::sse::{Event, Sse},
    routing::{get, post},
    Router,
};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build all routes for the gateway.
pub fn build_routes(state: GatewayState, cors_origins: &[String]) -> Router {
    Router::new()
        // Health
        .route("/health", get(health_handler))
        // Models
        .route("/api/models", get(models_handler))
        // Chat
        .route("/api/chat/stream", post(chat_stream_handler))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured frontend origins, with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            // A wildcard cannot be listed alongside credentials.
            Ok(_) if origin == "*" => {
                warn!("Ignoring wildcard CORS origin; list origins explicitly");
                None
            }
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

// ============================================================================
// Health
// ============================================================================

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

// ============================================================================
// Models
// ============================================================================

async fn models_handler(State(state): State<GatewayState>) -> Json<Vec<ModelItem>> {
    Json(state.models.items().to_vec())
}

// ============================================================================
// Chat
// ============================================================================

async fn chat_stream_handler(
    State(state): State<GatewayState>,
    Json(req): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let route = state.models.resolve(&req.model);
    info!(
        requested = %req.model,
        model = %route.model,
        provider = %route.provider,
        messages = req.messages.len(),
        "chat stream"
    );

    let events = relay_chat(state.providers.clone(), route, req.messages);
    Sse::new(events.map(|event| Ok(event.into_sse_event())))
}
