//! Terminal frontend built on ratatui and crossterm.

mod render;
mod theme;

use std::{io, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::{
    error::ServiceError,
    input::InputSource,
    services::game_service,
    state::SharedState,
};

/// Redraw cadence when nothing else wakes the loop (about 30 fps).
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

type Backend = CrosstermBackend<io::Stdout>;

/// Take over the terminal and run the game screen until shutdown.
pub async fn run(state: SharedState) -> Result<()> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    if let Err(err) = execute!(stdout, EnterAlternateScreen, cursor::Hide) {
        let _ = disable_raw_mode();
        return Err(err).context("entering alternate screen");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal")?;

    info!("terminal frontend started");
    let result = event_loop(&state, &mut terminal).await;

    // restore the terminal even when the loop failed
    let restored = disable_raw_mode()
        .and_then(|()| execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show));
    info!("terminal frontend stopped");

    result?;
    restored.context("restoring terminal")
}

async fn event_loop(state: &SharedState, terminal: &mut Terminal<Backend>) -> Result<()> {
    let keys = state.config().keys.clone();
    let mut events = EventStream::new();
    let mut frames = state.frame_watcher();
    let mut shutdown = state.shutdown_watcher();
    let mut tick = interval(FRAME_INTERVAL);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        if state.is_shutting_down() {
            break;
        }

        let snapshot = state.snapshot().await;
        terminal
            .draw(|frame| render::draw(frame, &snapshot, &keys))
            .context("drawing frame")?;

        tokio::select! {
            _ = tick.tick() => {}
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    let Some(action) = keys.action_for(&key) else {
                        debug!(?key, "unbound key");
                        continue;
                    };
                    match game_service::perform(state, action, InputSource::Keyboard).await {
                        Ok(_) | Err(ServiceError::ShuttingDown) => {}
                        Err(err) => warn!(error = %err, ?action, "keyboard action failed"),
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).context("reading terminal events"),
                None => break,
            },
        }
    }

    Ok(())
}
