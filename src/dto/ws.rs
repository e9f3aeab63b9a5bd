use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::dto::validation::{validate_button, validate_controller_name};

/// Kind of controller attached over the WebSocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    /// Sends whole button bitmasks.
    Gamepad,
    /// Sends individual press and release events for buttons 1 to 3.
    Buttons,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from controller WebSocket clients.
#[serde(tag = "type")]
pub enum ControllerInboundMessage {
    #[serde(rename = "identification")]
    Identification {
        device: DeviceKind,
        #[serde(default)]
        name: Option<String>,
    },
    #[serde(rename = "gamepad_report")]
    GamepadReport { state: u16 },
    #[serde(rename = "button")]
    Button { button: u8, pressed: bool },
    #[serde(other)]
    Unknown,
}

/// Reasons an inbound controller frame is refused.
#[derive(Debug, Error)]
pub enum InboundMessageError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

impl ControllerInboundMessage {
    /// Parse and validate a text frame.
    pub fn from_json_str(text: &str) -> Result<Self, InboundMessageError> {
        let message: Self = serde_json::from_str(text)?;
        message.validate()?;
        Ok(message)
    }
}

impl Validate for ControllerInboundMessage {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match self {
            Self::Identification {
                name: Some(name), ..
            } => {
                if let Err(e) = validate_controller_name(name) {
                    errors.add("name", e);
                }
            }
            Self::Button { button, .. } => {
                if let Err(e) = validate_button(*button) {
                    errors.add("button", e);
                }
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Positive acknowledgement sent to a controller after successful identification.
pub struct ControllerAck {
    #[serde(rename = "type")]
    #[schema(value_type = String)]
    pub kind: &'static str,
    pub id: Uuid,
    pub device: DeviceKind,
    pub status: String,
}

impl ControllerAck {
    pub fn ready(id: Uuid, device: DeviceKind) -> Self {
        Self {
            kind: "ack",
            id,
            device,
            status: "ready".into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Sent when a controller breaks the protocol.
pub struct ControllerRejected {
    #[serde(rename = "type")]
    #[schema(value_type = String)]
    pub kind: &'static str,
    pub reason: String,
}

impl ControllerRejected {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            kind: "rejected",
            reason: reason.into(),
        }
    }
}
