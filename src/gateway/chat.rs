use crate::gateway::protocol::RelayEvent;
use crate::models::ResolvedModel;
use crate::providers::{ChatMessage, ProviderError, ProviderRegistry, StreamEvent};

use futures::Stream;
use std::sync::Arc;
use tracing::{debug, warn};

/// Relay one chat request as a sequence of SSE events.
///
/// The routing decision goes out as `meta` before the provider is touched.
/// Provider output becomes `delta` events, any failure becomes a single
/// `error`, and every path ends in one `done`. Dropping the returned stream
/// (client disconnect) drops the provider receiver, which stops the
/// provider.
pub fn relay_chat(
    providers: Arc<ProviderRegistry>,
    route: ResolvedModel,
    messages: Vec<ChatMessage>,
) -> impl Stream<Item = RelayEvent> + Send + 'static {
    async_stream::stream! {
        yield RelayEvent::Meta(route.clone());

        match providers.get(&route.provider) {
            None => {
                warn!(provider = %route.provider, "requested provider is not configured");
                yield RelayEvent::error(ProviderError::Unavailable(route.provider.clone()));
            }
            Some(provider) => match provider.stream_chat(&route.model, &messages).await {
                Err(e) => {
                    warn!(provider = %route.provider, model = %route.model, "provider failed to start: {}", e);
                    yield RelayEvent::error(e);
                }
                Ok(mut rx) => loop {
                    match rx.recv().await {
                        Some(StreamEvent::Delta(text)) => {
                            yield RelayEvent::Delta { text };
                        }
                        Some(StreamEvent::Done) => break,
                        Some(StreamEvent::Error(message)) => {
                            warn!(provider = %route.provider, "provider stream failed: {}", message);
                            yield RelayEvent::Error { message };
                            break;
                        }
                        None => {
                            yield RelayEvent::error("provider stream ended unexpectedly");
                            break;
                        }
                    }
                },
            },
        }

        debug!(model = %route.model, provider = %route.provider, "chat stream finished");
        yield RelayEvent::Done;
    }
}
