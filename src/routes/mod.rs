use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod game;
pub mod health;
pub mod sse;
pub mod websocket;

/// Every HTTP, SSE and WebSocket route of the game server, bound to `state`.
pub fn router(state: SharedState) -> Router<()> {
    Router::new()
        .merge(health::router())
        .merge(game::router())
        .merge(sse::router())
        .merge(websocket::router())
        .merge(docs::router())
        .with_state(state)
}
