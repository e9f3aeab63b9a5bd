use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::game::{ActionRequest, GameSnapshot},
    error::AppError,
    input::InputSource,
    services::game_service,
    state::SharedState,
};

/// Routes exposing the running game.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/game", get(get_game))
        .route("/game/actions", post(post_action))
}

/// Current board, score and phase.
#[utoipa::path(
    get,
    path = "/game",
    tag = "game",
    responses(
        (status = 200, description = "Current game state", body = GameSnapshot)
    )
)]
pub async fn get_game(State(state): State<SharedState>) -> Json<GameSnapshot> {
    Json(state.snapshot().await)
}

/// Perform an action as if it came from a controller.
#[utoipa::path(
    post,
    path = "/game/actions",
    tag = "game",
    request_body = ActionRequest,
    responses(
        (status = 200, description = "Action applied", body = GameSnapshot),
        (status = 400, description = "Unknown action"),
        (status = 503, description = "Shutting down")
    )
)]
pub async fn post_action(
    State(state): State<SharedState>,
    Json(payload): Json<ActionRequest>,
) -> Result<Json<GameSnapshot>, AppError> {
    let snapshot = game_service::perform(&state, payload.action, InputSource::Api).await?;
    Ok(Json(snapshot))
}
