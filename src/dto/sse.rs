use std::time::SystemTime;

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{format_system_time, phase::VisibleGamePhase, ws::DeviceKind},
    input::{Action, InputSource},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether high scores survive a restart.
    pub persistent: bool,
    /// Number of controllers attached at connection time.
    pub controllers: usize,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the phase changes.
pub struct PhaseChangedEvent {
    pub phase: VisibleGamePhase,
    pub version: usize,
    /// Device whose action caused the change, absent for gravity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<InputSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a landing piece completes rows.
pub struct LinesClearedEvent {
    pub lines: u32,
    pub score: u32,
    pub level: u32,
    pub level_up: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Emitted when a controller attaches or detaches.
pub struct ControllerEvent {
    pub id: Uuid,
    pub device: DeviceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub at: String,
}

impl ControllerEvent {
    pub fn now(id: Uuid, device: DeviceKind, name: Option<String>) -> Self {
        Self {
            id,
            device,
            name,
            at: format_system_time(SystemTime::now()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Free-form notice, e.g. a new high score was saved.
pub struct InfoEvent {
    pub message: String,
}
