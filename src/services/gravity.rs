//! Background task pulling the falling piece down at the level's pace.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{services::game_service, state::SharedState};

/// Run gravity until shutdown is requested.
pub async fn run(state: SharedState) {
    let mut shutdown = state.shutdown_watcher();
    info!("gravity task started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        let wait = next_wait(&state).await;
        tokio::select! {
            _ = sleep(wait) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!("gravity task stopped");
}

/// Perform at most one step and return how long to sleep before the next one.
async fn next_wait(state: &SharedState) -> Duration {
    let interval = state.session().read().await.drop_interval();

    // a manual drop restarts the countdown so the piece does not fall twice in a row
    if let Some(dropped_at) = state.take_manual_drop().await {
        let remaining = interval.saturating_sub(dropped_at.elapsed());
        debug!(?remaining, "resynchronising after manual drop");
        return remaining;
    }

    if let Err(err) = game_service::gravity_step(state).await {
        warn!(error = %err, "gravity step failed");
    }

    // the level may have changed during the step
    state.session().read().await.drop_interval()
}

#[cfg(test)]
mod tests {
    use crate::{
        config::AppConfig,
        input::{Action, InputSource},
        state::tests::test_state,
    };

    use super::*;

    #[tokio::test]
    async fn step_moves_piece_down() {
        let state = test_state(AppConfig::default());
        let y = state.session().read().await.current().y();

        let wait = next_wait(&state).await;
        assert_eq!(wait, state.session().read().await.drop_interval());
        assert_eq!(state.session().read().await.current().y(), y + 1);
    }

    #[tokio::test]
    async fn manual_drop_delays_the_next_step() {
        let state = test_state(AppConfig::default());
        game_service::perform(&state, Action::SoftDrop, InputSource::Keyboard)
            .await
            .unwrap();
        let y = state.session().read().await.current().y();

        let wait = next_wait(&state).await;
        assert!(wait <= state.session().read().await.drop_interval());
        assert_eq!(state.session().read().await.current().y(), y);

        // the following call steps normally
        next_wait(&state).await;
        assert_eq!(state.session().read().await.current().y(), y + 1);
    }

    #[tokio::test]
    async fn stops_on_shutdown() {
        let state = test_state(AppConfig::default());
        let task = tokio::spawn(run(state.clone()));
        state.request_shutdown();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();
    }
}
