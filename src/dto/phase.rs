use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::GamePhase;

/// Publicly visible game phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// Pieces are falling.
    Playing,
    /// Gravity and movement are suspended.
    Paused,
    /// The stack reached the top.
    GameOver,
}

impl From<GamePhase> for VisibleGamePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Playing => VisibleGamePhase::Playing,
            GamePhase::Paused => VisibleGamePhase::Paused,
            GamePhase::GameOver => VisibleGamePhase::GameOver,
        }
    }
}
