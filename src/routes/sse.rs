use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse",
    tag = "sse",
    responses((status = 200, description = "Spectator SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream the game to spectators: a handshake, the current snapshot, then live events.
pub async fn spectator_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let (greeting, receiver) = sse_service::subscribe(&state).await;
    info!(
        spectators = state.sse().subscriber_count(),
        "new spectator SSE connection"
    );
    sse_service::to_sse_stream(greeting, receiver, state.shutdown_watcher())
}

/// Configure the SSE endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse", get(spectator_stream))
}
