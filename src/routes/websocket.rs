use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::Response,
    routing::get,
};
use tracing::debug;

use crate::{services::controller_service, state::SharedState};

/// Controllers open `/ws`, send an `identification` message within ten seconds,
/// then stream `gamepad_report` or `button` messages.
#[utoipa::path(
    get,
    path = "/ws",
    tag = "controllers",
    responses(
        (status = 101, description = "Switched to a controller WebSocket session"),
        (status = 400, description = "Not a WebSocket upgrade request")
    )
)]
pub async fn ws_handler(State(state): State<SharedState>, upgrade: WebSocketUpgrade) -> Response {
    debug!(
        connected = state.controllers().len(),
        "controller upgrade requested"
    );
    upgrade.on_upgrade(move |socket| controller_service::handle_socket(state, socket))
}

/// Route for gamepads and button boxes.
pub fn router() -> Router<SharedState> {
    Router::new().route("/ws", get(ws_handler))
}
