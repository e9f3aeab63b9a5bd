//! Chord detection for the three physical buttons.
//!
//! Presses arriving within a short window form a single gesture. When the window
//! closes (or a button is released first) the gesture resolves to the action bound
//! to the largest matching combination, and the resolver then ignores presses until
//! every button is released again.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::input::Action;

/// Number of physical buttons.
pub const BUTTON_COUNT: u8 = 3;
/// Default time allowed for the presses of a chord to arrive.
pub const DEFAULT_CHORD_WINDOW: Duration = Duration::from_millis(60);

const B1: u8 = 0b001;
const B2: u8 = 0b010;
const B3: u8 = 0b100;

const REVISED: &[(u8, Action)] = &[
    (B1, Action::MoveLeft),
    (B3, Action::MoveRight),
    (B2, Action::RotateClockwise),
    (B2 | B3, Action::SoftDrop),
    (B1 | B3, Action::HardDrop),
    (B1 | B2 | B3, Action::Pause),
    (B1 | B2, Action::Quit),
];

const ORIGINAL: &[(u8, Action)] = &[
    (B1, Action::MoveLeft),
    (B3, Action::MoveRight),
    (B2, Action::RotateClockwise),
    (B2 | B3, Action::SoftDrop),
    (B1 | B2, Action::HardDrop),
    (B1 | B2 | B3, Action::Quit),
];

/// Which README revision's button combinations to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ButtonScheme {
    /// Hard drop on 1+3, pause on all three, quit on 1+2.
    #[default]
    Revised,
    /// Hard drop on 1+2, quit on all three, no pause chord.
    Original,
}

impl ButtonScheme {
    /// Button mask to action table for this scheme.
    pub fn bindings(self) -> &'static [(u8, Action)] {
        match self {
            ButtonScheme::Revised => REVISED,
            ButtonScheme::Original => ORIGINAL,
        }
    }

    /// Action bound to exactly this set of buttons, or to its largest bound subset.
    pub fn resolve(self, pressed: u8) -> Option<Action> {
        self.bindings()
            .iter()
            .filter(|(mask, _)| pressed & mask == *mask)
            .fold(None::<(u8, Action)>, |best, (mask, action)| match best {
                Some((best_mask, _)) if best_mask.count_ones() >= mask.count_ones() => best,
                _ => Some((*mask, *action)),
            })
            .map(|(_, action)| action)
    }

    /// Human readable combination for `action`, e.g. `1+3`.
    pub fn combo_for(self, action: Action) -> Option<String> {
        self.bindings()
            .iter()
            .find(|(_, bound)| *bound == action)
            .map(|(mask, _)| {
                (0..BUTTON_COUNT)
                    .filter(|index| mask & (1 << index) != 0)
                    .map(|index| (index + 1).to_string())
                    .collect::<Vec<_>>()
                    .join("+")
            })
    }
}

/// Mask bit for a 1-based button number.
pub fn button_bit(button: u8) -> Option<u8> {
    (1..=BUTTON_COUNT).contains(&button).then(|| 1 << (button - 1))
}

/// Groups button presses into chords and resolves them against a scheme.
#[derive(Debug, Clone)]
pub struct ChordResolver {
    scheme: ButtonScheme,
    window: Duration,
    held: u8,
    gesture: u8,
    deadline: Option<Instant>,
    latched: bool,
}

impl ChordResolver {
    pub fn new(scheme: ButtonScheme, window: Duration) -> Self {
        Self {
            scheme,
            window,
            held: 0,
            gesture: 0,
            deadline: None,
            latched: false,
        }
    }

    /// Moment the pending gesture resolves, if one is being collected.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Buttons currently held down.
    pub fn held(&self) -> u8 {
        self.held
    }

    /// Record a press of a 1-based button. Unknown buttons are ignored.
    pub fn press(&mut self, button: u8, now: Instant) {
        let Some(bit) = button_bit(button) else {
            return;
        };
        self.held |= bit;
        if self.latched {
            return;
        }
        self.gesture |= bit;
        if self.deadline.is_none() {
            self.deadline = Some(now + self.window);
        }
    }

    /// Record a release. A release before the window closes resolves the gesture early.
    pub fn release(&mut self, button: u8) -> Option<Action> {
        let bit = button_bit(button)?;
        self.held &= !bit;

        let action = if self.deadline.is_some() {
            self.fire()
        } else {
            None
        };

        if self.held == 0 {
            self.latched = false;
        }
        action
    }

    /// Resolve the pending gesture once its window has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Action> {
        match self.deadline {
            Some(deadline) if now >= deadline => self.fire(),
            _ => None,
        }
    }

    fn fire(&mut self) -> Option<Action> {
        let gesture = std::mem::take(&mut self.gesture);
        self.deadline = None;
        self.latched = self.held != 0;
        self.scheme.resolve(gesture)
    }
}
