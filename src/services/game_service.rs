use tracing::{debug, info, warn};

use crate::{
    dto::{game::GameSnapshot, sse::LinesClearedEvent},
    error::ServiceError,
    input::{Action, InputSource},
    services::sse_events,
    state::{
        SharedState,
        game::{GameSession, StepOutcome},
        state_machine::{GameEvent, GamePhase, GameStateMachine, Snapshot},
    },
};

/// Side effects collected while the locks are held and published once they are released.
#[derive(Default)]
struct Effects {
    phase_changes: Vec<Snapshot>,
    lines_cleared: Option<LinesClearedEvent>,
    save: Option<u32>,
    manual_drop: bool,
}

/// Replace the initial high score with the saved one when it is greater.
pub async fn load_saved_high_score(state: &SharedState) -> Result<Option<u32>, ServiceError> {
    let saved = state.score_store().load_high_score().await?;
    if let Some(score) = saved {
        state.session().write().await.adopt_saved_high_score(score);
        info!(score, "loaded saved high score");
    }
    Ok(saved)
}

/// Apply a player action coming from any input device.
pub async fn perform(
    state: &SharedState,
    action: Action,
    source: InputSource,
) -> Result<GameSnapshot, ServiceError> {
    if state.is_shutting_down() {
        return Err(ServiceError::ShuttingDown);
    }

    let mut effects = Effects::default();
    let mut quit = false;
    let snapshot = {
        let mut session = state.session().write().await;
        let mut machine = state.machine().write().await;
        let phase = machine.phase();

        match (action, phase) {
            (Action::Pause, GamePhase::Playing) => {
                transition(&mut machine, GameEvent::Pause, &mut effects)?;
            }
            (Action::Pause, GamePhase::Paused) => {
                transition(&mut machine, GameEvent::Resume, &mut effects)?;
            }
            (Action::Pause | Action::RotateClockwise | Action::HardDrop, GamePhase::GameOver) => {
                restart(&mut session, &mut machine, &mut effects)?;
            }
            (Action::Quit, _) => {
                if session.reached_high_score() {
                    effects.save = Some(session.score());
                }
                quit = true;
            }
            (_, GamePhase::Playing) => apply_move(&mut session, action, &mut effects),
            (_, GamePhase::Paused | GamePhase::GameOver) => {
                debug!(?action, ?phase, "action ignored outside of play");
            }
        }

        GameSnapshot::capture(&session, machine.snapshot())
    };

    debug!(?action, ?source, "action performed");
    if effects.manual_drop {
        state.mark_manual_drop().await;
    }
    publish(state, effects, &snapshot, Some((source, action))).await;

    if quit {
        info!(?source, "quit requested");
        state.request_shutdown();
    }

    Ok(snapshot)
}

/// Advance the falling piece by one row, handling landings and top outs.
///
/// Returns `None` when the game is not being played.
pub async fn gravity_step(state: &SharedState) -> Result<Option<StepOutcome>, ServiceError> {
    let mut effects = Effects::default();
    let (outcome, snapshot) = {
        let mut session = state.session().write().await;
        let mut machine = state.machine().write().await;
        if !machine.is_playing() {
            return Ok(None);
        }

        let outcome = session.step();
        match outcome {
            StepOutcome::Fell => {}
            StepOutcome::Locked { lines, level_up } => {
                if lines > 0 {
                    effects.lines_cleared = Some(LinesClearedEvent {
                        lines,
                        score: session.score(),
                        level: session.level(),
                        level_up,
                    });
                }
            }
            StepOutcome::ToppedOut => {
                info!(score = session.score(), level = session.level(), "topped out");
                if session.reached_high_score() {
                    effects.save = Some(session.score());
                }
                session.reset(true);
                transition(&mut machine, GameEvent::TopOut, &mut effects)?;
                if state.config().auto_restart {
                    transition(&mut machine, GameEvent::Restart, &mut effects)?;
                }
            }
        }

        (outcome, GameSnapshot::capture(&session, machine.snapshot()))
    };

    if let Some(event) = &effects.lines_cleared {
        debug!(lines = event.lines, score = event.score, "lines cleared");
    }
    publish(state, effects, &snapshot, None).await;
    Ok(Some(outcome))
}

fn apply_move(session: &mut GameSession, action: Action, effects: &mut Effects) {
    match action {
        Action::MoveLeft => {
            session.move_left();
        }
        Action::MoveRight => {
            session.move_right();
        }
        Action::RotateClockwise => {
            session.rotate_clockwise();
        }
        Action::SoftDrop => effects.manual_drop = session.soft_drop(),
        Action::HardDrop => effects.manual_drop = session.hard_drop() > 0,
        Action::Pause | Action::Quit => {}
    }
}

fn restart(
    session: &mut GameSession,
    machine: &mut GameStateMachine,
    effects: &mut Effects,
) -> Result<(), ServiceError> {
    session.reset(false);
    transition(machine, GameEvent::Restart, effects)
}

fn transition(
    machine: &mut GameStateMachine,
    event: GameEvent,
    effects: &mut Effects,
) -> Result<(), ServiceError> {
    machine.apply(event)?;
    effects.phase_changes.push(machine.snapshot());
    Ok(())
}

async fn publish(
    state: &SharedState,
    effects: Effects,
    snapshot: &GameSnapshot,
    cause: Option<(InputSource, Action)>,
) {
    for change in effects.phase_changes {
        sse_events::broadcast_phase_changed(state, change, cause);
    }
    if let Some(event) = &effects.lines_cleared {
        sse_events::broadcast_lines_cleared(state, event);
    }
    sse_events::broadcast_snapshot(state, snapshot);
    state.notify_frame();

    if let Some(score) = effects.save {
        persist_high_score(state, score).await;
    }
}

async fn persist_high_score(state: &SharedState, score: u32) {
    match state.score_store().save_high_score(score).await {
        Ok(()) => {
            info!(score, "saved high score");
            sse_events::broadcast_info(state, format!("new high score: {score}"));
        }
        Err(err) => warn!(score, error = %err, "failed to save high score"),
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::AppConfig,
        state::{board::Tile, tests::test_state},
    };

    use super::*;

    async fn phase(state: &SharedState) -> GamePhase {
        state.phase().await
    }

    /// Fill everything below the spawn rows so the next landing tops out.
    async fn bury(state: &SharedState) {
        let mut session = state.session().write().await;
        let height = session.board().height() as i32;
        let width = session.board().width() as i32;
        for y in 2..height {
            for x in 1..width {
                session.board_mut().set(x, y, Some(Tile::Red));
            }
        }
    }

    async fn step_until_top_out(state: &SharedState) {
        for _ in 0..4 {
            if gravity_step(state).await.unwrap() == Some(StepOutcome::ToppedOut) {
                return;
            }
        }
        panic!("expected a top out");
    }

    #[tokio::test]
    async fn pause_toggles_and_blocks_moves() {
        let state = test_state(AppConfig::default());

        perform(&state, Action::Pause, InputSource::Keyboard).await.unwrap();
        assert_eq!(phase(&state).await, GamePhase::Paused);

        let x = state.session().read().await.current().x();
        let snapshot = perform(&state, Action::MoveLeft, InputSource::Keyboard)
            .await
            .unwrap();
        assert_eq!(state.session().read().await.current().x(), x);
        assert_eq!(snapshot.phase, GamePhase::Paused.into());

        assert_eq!(gravity_step(&state).await.unwrap(), None);

        perform(&state, Action::Pause, InputSource::Gamepad).await.unwrap();
        assert_eq!(phase(&state).await, GamePhase::Playing);
    }

    #[tokio::test]
    async fn moves_apply_while_playing() {
        let state = test_state(AppConfig::default());
        let x = state.session().read().await.current().x();
        perform(&state, Action::MoveLeft, InputSource::Buttons).await.unwrap();
        assert_eq!(state.session().read().await.current().x(), x - 1);
    }

    #[tokio::test]
    async fn drops_mark_manual_drop() {
        let state = test_state(AppConfig::default());
        perform(&state, Action::SoftDrop, InputSource::Keyboard).await.unwrap();
        assert!(state.take_manual_drop().await.is_some());

        perform(&state, Action::HardDrop, InputSource::Keyboard).await.unwrap();
        assert!(state.take_manual_drop().await.is_some());

        // already resting on the floor, nothing moved
        perform(&state, Action::HardDrop, InputSource::Keyboard).await.unwrap();
        assert!(state.take_manual_drop().await.is_none());
    }

    #[tokio::test]
    async fn top_out_without_auto_restart_waits_for_input() {
        let state = test_state(AppConfig {
            auto_restart: false,
            ..AppConfig::default()
        });
        bury(&state).await;
        step_until_top_out(&state).await;

        assert_eq!(phase(&state).await, GamePhase::GameOver);
        {
            let session = state.session().read().await;
            assert_eq!(session.mood(), crate::state::game::MOOD_GAME_OVER);
            assert_eq!(session.score(), 0);
        }

        // movement is ignored, rotate restarts
        perform(&state, Action::MoveLeft, InputSource::Keyboard).await.unwrap();
        assert_eq!(phase(&state).await, GamePhase::GameOver);
        perform(&state, Action::RotateClockwise, InputSource::Keyboard)
            .await
            .unwrap();
        assert_eq!(phase(&state).await, GamePhase::Playing);
        assert_eq!(state.session().read().await.mood(), 0);
    }

    #[tokio::test]
    async fn top_out_with_auto_restart_keeps_playing() {
        let state = test_state(AppConfig {
            auto_restart: true,
            ..AppConfig::default()
        });
        let mut sse = state.sse().subscribe();
        bury(&state).await;
        step_until_top_out(&state).await;

        assert_eq!(phase(&state).await, GamePhase::Playing);
        assert_eq!(state.machine().read().await.snapshot().version, 2);

        let mut phase_events = 0;
        while let Ok(event) = sse.try_recv() {
            if event.event.as_deref() == Some("phase_changed") {
                phase_events += 1;
            }
        }
        assert_eq!(phase_events, 2);
    }

    #[tokio::test]
    async fn high_score_is_saved_on_top_out() {
        let state = test_state(AppConfig {
            auto_restart: true,
            ..AppConfig::default()
        });
        // clearing the bottom row on the next landing scores 40
        {
            let mut session = state.session().write().await;
            let height = session.board().height() as i32;
            let width = session.board().width() as i32;
            for x in 0..width {
                session.board_mut().set(x, height - 1, Some(Tile::Blue));
            }
            session.board_mut().set(4, height - 1, None);
            session.board_mut().set(5, height - 1, None);
            session.set_current(crate::state::tetromino::Tetromino::spawn(
                crate::state::tetromino::Shape::O,
                width as usize,
            ));
        }
        perform(&state, Action::HardDrop, InputSource::Keyboard).await.unwrap();
        assert!(matches!(
            gravity_step(&state).await.unwrap(),
            Some(StepOutcome::Locked { lines: 1, .. })
        ));
        let score = state.session().read().await.score();
        assert!(score > 0);

        bury(&state).await;
        step_until_top_out(&state).await;

        assert_eq!(state.score_store().load_high_score().await.unwrap(), Some(score));
    }

    #[tokio::test]
    async fn quit_requests_shutdown() {
        let state = test_state(AppConfig::default());
        perform(&state, Action::Quit, InputSource::Keyboard).await.unwrap();
        assert!(state.is_shutting_down());
        assert!(matches!(
            perform(&state, Action::MoveLeft, InputSource::Keyboard).await,
            Err(ServiceError::ShuttingDown)
        ));
    }

    #[tokio::test]
    async fn saved_high_score_is_adopted() {
        let state = test_state(AppConfig::default());
        state.score_store().save_high_score(5000).await.unwrap();
        assert_eq!(load_saved_high_score(&state).await.unwrap(), Some(5000));
        assert_eq!(state.session().read().await.high_score(), 5000);
    }
}
