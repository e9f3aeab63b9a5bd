use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether the high score is written to disk.
    pub persistent: bool,
}

impl HealthResponse {
    /// Create a health response indicating the score store answered.
    pub fn ok(persistent: bool) -> Self {
        Self {
            status: "ok".to_string(),
            persistent,
        }
    }

    /// Create a health response indicating the score store failed its check.
    pub fn degraded(persistent: bool) -> Self {
        Self {
            status: "degraded".to_string(),
            persistent,
        }
    }
}
