//! Single-shot SSE emission.
//!
//! A request stream opens, carries exactly one terminal event, and closes.

use std::convert::Infallible;
use std::sync::Arc;

use axum::response::sse::Event;
use futures::stream::{self, Stream};
use serde_json::json;
use tracing::error;

use crate::dispatch::Dispatcher;
use crate::protocol::{McpRequest, McpResponse, Outcome, RequestId};

pub const EVENT_RESULT: &str = "result";
pub const EVENT_ERROR: &str = "error";

/// The one event that ends a request's stream.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalEvent {
    pub name: &'static str,
    pub response: McpResponse,
}

impl TerminalEvent {
    pub fn from_outcome(id: RequestId, outcome: Outcome) -> Self {
        let name = if outcome.is_success() {
            EVENT_RESULT
        } else {
            EVENT_ERROR
        };
        Self {
            name,
            response: outcome.into_response(id),
        }
    }

    pub fn into_sse(self) -> Event {
        match serde_json::to_string(&self.response) {
            Ok(data) => Event::default().event(self.name).data(data),
            Err(e) => {
                error!(id = %self.response.id, "Failed to serialize terminal event: {e}");
                let data = json!({
                    "id": self.response.id,
                    "error": { "kind": "internal_failure", "message": "Internal error" }
                });
                Event::default().event(EVENT_ERROR).data(data.to_string())
            }
        }
    }
}

/// Stream that dispatches `request` when first polled and yields its
/// terminal event. Dropping the stream drops the in-flight remote call.
pub fn single_event_stream(
    dispatcher: Arc<Dispatcher>,
    request: McpRequest,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::once(async move {
        let outcome = dispatcher.dispatch(&request).await;
        Ok(TerminalEvent::from_outcome(request.id, outcome).into_sse())
    })
}
