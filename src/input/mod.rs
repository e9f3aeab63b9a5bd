//! Player commands and the devices that produce them.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Three physical buttons with chorded combinations.
pub mod buttons;
/// USB-style gamepad reports.
pub mod gamepad;
/// Terminal key bindings.
pub mod keyboard;

/// A command issued by any input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    MoveLeft,
    MoveRight,
    RotateClockwise,
    SoftDrop,
    HardDrop,
    Pause,
    Quit,
}

impl Action {
    /// Every action, in control-table order.
    pub const ALL: [Action; 7] = [
        Action::MoveLeft,
        Action::MoveRight,
        Action::RotateClockwise,
        Action::SoftDrop,
        Action::HardDrop,
        Action::Pause,
        Action::Quit,
    ];

    /// Label shown in help overlays.
    pub fn label(self) -> &'static str {
        match self {
            Action::MoveLeft => "Move Left",
            Action::MoveRight => "Move Right",
            Action::RotateClockwise => "Rotate",
            Action::SoftDrop => "Soft Drop",
            Action::HardDrop => "Hard Drop",
            Action::Pause => "Pause",
            Action::Quit => "Quit",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of device an action came from, carried into logs and SSE events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    Keyboard,
    Gamepad,
    Buttons,
    Api,
}
