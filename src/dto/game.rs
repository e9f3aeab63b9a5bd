use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::{format_system_time, phase::VisibleGamePhase},
    input::Action,
    state::{
        board::Tile,
        game::GameSession,
        state_machine::Snapshot,
        tetromino::Shape,
    },
};

/// Everything needed to draw the screen, shared by the terminal UI, REST and SSE.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct GameSnapshot {
    pub phase: VisibleGamePhase,
    /// Incremented on every phase transition.
    pub version: usize,
    pub width: usize,
    pub height: usize,
    /// Rows from top to bottom with the falling piece drawn in.
    pub cells: Vec<Vec<Option<Tile>>>,
    /// Shape shown in the preview box.
    pub next: Shape,
    pub score: u32,
    pub high_score: u32,
    pub level: u32,
    /// Lines cleared since the last level up.
    pub lines: u32,
    /// Lines needed to reach the next level.
    pub lines_for_level: u32,
    /// Fill ratio of the drink gauge, from 0 to 1.
    pub level_progress: f32,
    /// Face index: 0 calm, 1 worried, 2 panicked, 3 game over.
    pub mood: u8,
    pub captured_at: String,
}

impl GameSnapshot {
    /// Capture the session and phase; callers hold both locks.
    pub fn capture(session: &GameSession, machine: Snapshot) -> Self {
        let board = session.board();
        let mut cells: Vec<Vec<Option<Tile>>> = board.rows().map(<[_]>::to_vec).collect();

        let piece = session.current();
        let tile = piece.shape().tile();
        for (x, y) in piece.cells() {
            if x < 0 || y < 0 {
                continue;
            }
            if let Some(cell) = cells
                .get_mut(y as usize)
                .and_then(|row| row.get_mut(x as usize))
            {
                *cell = Some(tile);
            }
        }

        Self {
            phase: machine.phase.into(),
            version: machine.version,
            width: board.width(),
            height: board.height(),
            cells,
            next: session.next_shape(),
            score: session.score(),
            high_score: session.high_score(),
            level: session.level(),
            lines: session.lines(),
            lines_for_level: session.lines_for_level(),
            level_progress: session.level_progress(),
            mood: session.mood(),
            captured_at: format_system_time(SystemTime::now()),
        }
    }
}

/// Body of `POST /game/actions`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ActionRequest {
    pub action: Action,
}
