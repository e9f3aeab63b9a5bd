use thiserror::Error;

/// High-level phases the game can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Pieces are falling and input moves them.
    Playing,
    /// Gravity is suspended until the player resumes.
    Paused,
    /// The stack reached the top; waiting for a restart.
    GameOver,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Suspend gravity and input.
    Pause,
    /// Continue after a pause.
    Resume,
    /// A piece locked at the top of the well.
    TopOut,
    /// Start a fresh game.
    Restart,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: GamePhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
}

/// State machine driving the pause / game-over flow of a session.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    version: usize,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Playing,
            version: 0,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine with a game already running.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Apply `event`, returning the new phase.
    pub fn apply(&mut self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (GamePhase::Playing, GameEvent::Pause) => GamePhase::Paused,
            (GamePhase::Paused, GameEvent::Resume) => GamePhase::Playing,
            (GamePhase::Playing, GameEvent::TopOut) => GamePhase::GameOver,
            (GamePhase::GameOver | GamePhase::Paused, GameEvent::Restart) => GamePhase::Playing,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}
