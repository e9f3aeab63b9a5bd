use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        game::GameSnapshot,
        sse::{ControllerEvent, InfoEvent, LinesClearedEvent, PhaseChangedEvent, ServerEvent},
    },
    input::{Action, InputSource},
    state::{ControllerConnection, SharedState, state_machine::Snapshot},
};

pub(crate) const EVENT_HANDSHAKE: &str = "handshake";
pub(crate) const EVENT_SNAPSHOT: &str = "snapshot";
const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_LINES_CLEARED: &str = "lines_cleared";
const EVENT_CONTROLLER_CONNECTED: &str = "controller.connected";
const EVENT_CONTROLLER_DISCONNECTED: &str = "controller.disconnected";
const EVENT_INFO: &str = "info";

/// Broadcast the full render state.
pub fn broadcast_snapshot(state: &SharedState, snapshot: &GameSnapshot) {
    send_event(state, EVENT_SNAPSHOT, snapshot);
}

/// Broadcast a phase transition and what caused it.
pub fn broadcast_phase_changed(
    state: &SharedState,
    snapshot: Snapshot,
    cause: Option<(InputSource, Action)>,
) {
    let payload = PhaseChangedEvent {
        phase: snapshot.phase.into(),
        version: snapshot.version,
        source: cause.map(|(source, _)| source),
        action: cause.map(|(_, action)| action),
    };
    send_event(state, EVENT_PHASE_CHANGED, &payload);
}

/// Broadcast rows cleared by a landing piece.
pub fn broadcast_lines_cleared(state: &SharedState, payload: &LinesClearedEvent) {
    send_event(state, EVENT_LINES_CLEARED, payload);
}

pub fn broadcast_controller_connected(state: &SharedState, connection: &ControllerConnection) {
    let payload = ControllerEvent::now(connection.id, connection.device, connection.name.clone());
    send_event(state, EVENT_CONTROLLER_CONNECTED, &payload);
}

pub fn broadcast_controller_disconnected(state: &SharedState, connection: &ControllerConnection) {
    let payload = ControllerEvent::now(connection.id, connection.device, connection.name.clone());
    send_event(state, EVENT_CONTROLLER_DISCONNECTED, &payload);
}

/// Send a human-readable notice to every spectator.
pub fn broadcast_info(state: &SharedState, message: impl Into<String>) {
    let payload = InfoEvent {
        message: message.into(),
    };
    send_event(state, EVENT_INFO, &payload);
}

fn send_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}
