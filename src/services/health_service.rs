use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the high score store is usable.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let persistent = state.is_persistent();
    match state.score_store().health_check().await {
        Ok(()) => HealthResponse::ok(persistent),
        Err(err) => {
            warn!(error = %err, "score store health check failed");
            HealthResponse::degraded(persistent)
        }
    }
}
