pub mod board;
pub mod game;
mod sse;
pub mod state_machine;
pub mod tetromino;

use std::{sync::Arc, time::Instant};

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::score_store::ScoreStore,
    dto::{game::GameSnapshot, ws::DeviceKind},
    state::{game::GameSession, state_machine::GamePhase},
};

pub use self::sse::SseHub;
pub use self::state_machine::Snapshot;
use self::state_machine::GameStateMachine;

pub type SharedState = Arc<AppState>;

const SSE_CAPACITY: usize = 64;

#[derive(Clone)]
/// Handle used to push messages to a connected controller.
pub struct ControllerConnection {
    pub id: Uuid,
    pub device: DeviceKind,
    pub name: Option<String>,
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state shared by the game loop, the terminal UI and the server.
///
/// Lock order is always `session` then `machine`.
pub struct AppState {
    config: AppConfig,
    session: RwLock<GameSession>,
    machine: RwLock<GameStateMachine>,
    score_store: Arc<dyn ScoreStore>,
    persistent: bool,
    sse: SseHub,
    controllers: DashMap<Uuid, ControllerConnection>,
    last_manual_drop: Mutex<Option<Instant>>,
    frames: watch::Sender<u64>,
    shutdown: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// `persistent` tells clients whether `score_store` writes to disk.
    pub fn new(config: AppConfig, score_store: Arc<dyn ScoreStore>, persistent: bool) -> SharedState {
        let (frames, _rx) = watch::channel(0);
        let (shutdown, _rx) = watch::channel(false);
        let session = GameSession::new(config.game.clone());
        Arc::new(Self {
            config,
            session: RwLock::new(session),
            machine: RwLock::new(GameStateMachine::new()),
            score_store,
            persistent,
            sse: SseHub::new(SSE_CAPACITY),
            controllers: DashMap::new(),
            last_manual_drop: Mutex::new(None),
            frames,
            shutdown,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The running game; take this lock before [`AppState::machine`].
    pub fn session(&self) -> &RwLock<GameSession> {
        &self.session
    }

    /// The pause / game-over state machine.
    pub fn machine(&self) -> &RwLock<GameStateMachine> {
        &self.machine
    }

    pub fn score_store(&self) -> Arc<dyn ScoreStore> {
        self.score_store.clone()
    }

    /// Whether the high score is written to disk.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Broadcast hub used for the spectator SSE stream.
    pub fn sse(&self) -> &SseHub {
        &self.sse
    }

    /// Registry of active controller sockets keyed by their identifier.
    pub fn controllers(&self) -> &DashMap<Uuid, ControllerConnection> {
        &self.controllers
    }

    /// Snapshot the current phase of the shared game state machine.
    pub async fn phase(&self) -> GamePhase {
        self.machine.read().await.phase()
    }

    /// Capture the full render state.
    pub async fn snapshot(&self) -> GameSnapshot {
        let session = self.session.read().await;
        let machine = self.machine.read().await;
        GameSnapshot::capture(&session, machine.snapshot())
    }

    /// Remember that the player just pushed the piece down.
    pub async fn mark_manual_drop(&self) {
        *self.last_manual_drop.lock().await = Some(Instant::now());
    }

    /// Consume the pending manual drop instant, if any.
    pub async fn take_manual_drop(&self) -> Option<Instant> {
        self.last_manual_drop.lock().await.take()
    }

    /// Wake every renderer waiting on [`AppState::frame_watcher`].
    pub fn notify_frame(&self) {
        self.frames.send_modify(|frame| *frame = frame.wrapping_add(1));
    }

    /// Subscribe to redraw notifications.
    pub fn frame_watcher(&self) -> watch::Receiver<u64> {
        self.frames.subscribe()
    }

    /// Ask every task to stop.
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Whether shutdown has been requested.
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Subscribe to the shutdown flag.
    pub fn shutdown_watcher(&self) -> watch::Receiver<bool> {
        self.shutdown.subscribe()
    }

    /// Resolves once shutdown has been requested.
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.shutdown.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}
