use crate::input::Action;

/// Face button A.
pub const A: u16 = 1 << 0;
/// Face button B.
pub const B: u16 = 1 << 1;
/// Face button X.
pub const X: u16 = 1 << 2;
/// Face button Y.
pub const Y: u16 = 1 << 3;
/// Left shoulder.
pub const L: u16 = 1 << 4;
/// Right shoulder.
pub const R: u16 = 1 << 5;
/// Select / back.
pub const SELECT: u16 = 1 << 6;
/// Start.
pub const START: u16 = 1 << 7;
/// D-pad up.
pub const UP: u16 = 1 << 8;
/// D-pad down.
pub const DOWN: u16 = 1 << 9;
/// D-pad left.
pub const LEFT: u16 = 1 << 10;
/// D-pad right.
pub const RIGHT: u16 = 1 << 11;

/// Gamepad button to action table, evaluated in order on each report.
pub const GAMEPAD_MAP: [(u16, Action); 8] = [
    (A, Action::RotateClockwise),
    (B, Action::HardDrop),
    (DOWN, Action::SoftDrop),
    (START, Action::Pause),
    (SELECT, Action::Quit),
    (LEFT, Action::MoveLeft),
    (RIGHT, Action::MoveRight),
    (UP, Action::RotateClockwise),
];

/// Turns successive button bitmasks into actions on each rising edge.
#[derive(Debug, Clone, Default)]
pub struct GamepadTracker {
    previous: u16,
}

impl GamepadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a new report and collect the actions of newly pressed buttons.
    pub fn update(&mut self, report: u16) -> Vec<Action> {
        let changed = self.previous ^ report;
        self.previous = report;
        GAMEPAD_MAP
            .iter()
            .filter(|(button, _)| changed & report & button != 0)
            .map(|(_, action)| *action)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_on_press_only() {
        let mut pad = GamepadTracker::new();
        assert_eq!(pad.update(LEFT), vec![Action::MoveLeft]);
        assert!(pad.update(LEFT).is_empty());
        assert!(pad.update(0).is_empty());
        assert_eq!(pad.update(LEFT), vec![Action::MoveLeft]);
    }

    #[test]
    fn new_button_while_another_is_held() {
        let mut pad = GamepadTracker::new();
        pad.update(DOWN);
        assert_eq!(pad.update(DOWN | B), vec![Action::HardDrop]);
    }

    #[test]
    fn documented_buttons_map_to_actions() {
        let cases = [
            (LEFT, Action::MoveLeft),
            (RIGHT, Action::MoveRight),
            (UP, Action::RotateClockwise),
            (A, Action::RotateClockwise),
            (DOWN, Action::SoftDrop),
            (B, Action::HardDrop),
            (START, Action::Pause),
            (SELECT, Action::Quit),
        ];
        for (button, action) in cases {
            let mut pad = GamepadTracker::new();
            assert_eq!(pad.update(button), vec![action], "button {button:#06x}");
        }
    }

    #[test]
    fn unmapped_buttons_are_ignored() {
        let mut pad = GamepadTracker::new();
        assert!(pad.update(X | Y | L | R).is_empty());
    }

    #[test]
    fn held_button_fires_again_after_release() {
        let mut pad = GamepadTracker::new();
        assert_eq!(pad.update(START), vec![Action::Pause]);
        assert!(pad.update(START).is_empty());
        assert!(pad.update(0).is_empty());
        assert_eq!(pad.update(START), vec![Action::Pause]);
    }
}
