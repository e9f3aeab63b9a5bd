use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;

use crate::input::Action;

/// Raised when configured key bindings cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyBindingError {
    #[error("unknown key name `{0}`")]
    UnknownKey(String),
    #[error("key `{key}` is bound to both {first:?} and {second:?}")]
    Duplicate {
        key: String,
        first: Action,
        second: Action,
    },
}

/// Mapping from terminal keys to actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    keys: HashMap<KeyCode, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let table: [(Action, &[KeyCode]); 7] = [
            (Action::MoveLeft, &[KeyCode::Left, KeyCode::Char('a')]),
            (Action::MoveRight, &[KeyCode::Right, KeyCode::Char('d')]),
            (
                Action::RotateClockwise,
                &[KeyCode::Up, KeyCode::Char('x'), KeyCode::Char('w')],
            ),
            (Action::SoftDrop, &[KeyCode::Down, KeyCode::Char('s')]),
            (Action::HardDrop, &[KeyCode::Char('z'), KeyCode::Char(' ')]),
            (Action::Pause, &[KeyCode::Enter]),
            (Action::Quit, &[KeyCode::Esc, KeyCode::Char('q')]),
        ];

        let keys = table
            .into_iter()
            .flat_map(|(action, codes)| codes.iter().map(move |code| (*code, action)))
            .collect();
        Self { keys }
    }
}

impl KeyBindings {
    /// Default bindings with the listed actions rebound to the given key names.
    ///
    /// An action present in `overrides` loses all of its default keys. A key named
    /// for two different actions is an error.
    pub fn with_overrides(
        overrides: &HashMap<Action, Vec<String>>,
    ) -> Result<Self, KeyBindingError> {
        let mut claimed: HashMap<KeyCode, Action> = HashMap::new();
        for (action, names) in overrides {
            for name in names {
                let code = parse_key_name(name)?;
                match claimed.insert(code, *action) {
                    Some(other) if other != *action => {
                        return Err(KeyBindingError::Duplicate {
                            key: key_display_name(&code),
                            first: other,
                            second: *action,
                        });
                    }
                    _ => {}
                }
            }
        }

        let mut bindings = Self::default();
        bindings
            .keys
            .retain(|code, bound| !overrides.contains_key(bound) && !claimed.contains_key(code));
        bindings.keys.extend(claimed);
        Ok(bindings)
    }

    /// Resolve a key press into an action. Ctrl+C always quits.
    pub fn action_for(&self, key: &KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }
        let code = match key.code {
            KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
            other => other,
        };
        self.keys.get(&code).copied()
    }

    /// Display names of the keys bound to `action`, sorted for stable output.
    pub fn keys_for(&self, action: Action) -> Vec<String> {
        let mut names: Vec<String> = self
            .keys
            .iter()
            .filter(|(_, bound)| **bound == action)
            .map(|(code, _)| key_display_name(code))
            .collect();
        names.sort();
        names
    }
}

/// Parse a key name such as `left`, `enter`, `space` or a single character.
pub fn parse_key_name(name: &str) -> Result<KeyCode, KeyBindingError> {
    let lowered = name.trim().to_ascii_lowercase();
    let code = match lowered.as_str() {
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "space" => KeyCode::Char(' '),
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return Err(KeyBindingError::UnknownKey(name.to_string())),
            }
        }
    };
    Ok(code)
}

fn key_display_name(code: &KeyCode) -> String {
    match code {
        KeyCode::Left => "Left".into(),
        KeyCode::Right => "Right".into(),
        KeyCode::Up => "Up".into(),
        KeyCode::Down => "Down".into(),
        KeyCode::Enter => "Enter".into(),
        KeyCode::Esc => "Esc".into(),
        KeyCode::Tab => "Tab".into(),
        KeyCode::Backspace => "Backspace".into(),
        KeyCode::Char(' ') => "Space".into(),
        KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn default_table_matches_documented_controls() {
        let keys = KeyBindings::default();
        assert_eq!(keys.action_for(&press(KeyCode::Left)), Some(Action::MoveLeft));
        assert_eq!(keys.action_for(&press(KeyCode::Right)), Some(Action::MoveRight));
        assert_eq!(keys.action_for(&press(KeyCode::Up)), Some(Action::RotateClockwise));
        assert_eq!(
            keys.action_for(&press(KeyCode::Char('x'))),
            Some(Action::RotateClockwise)
        );
        assert_eq!(keys.action_for(&press(KeyCode::Down)), Some(Action::SoftDrop));
        assert_eq!(keys.action_for(&press(KeyCode::Char('z'))), Some(Action::HardDrop));
        assert_eq!(keys.action_for(&press(KeyCode::Enter)), Some(Action::Pause));
        assert_eq!(keys.action_for(&press(KeyCode::Esc)), Some(Action::Quit));
    }

    #[test]
    fn letters_are_case_insensitive() {
        let keys = KeyBindings::default();
        assert_eq!(keys.action_for(&press(KeyCode::Char('Z'))), Some(Action::HardDrop));
    }

    #[test]
    fn ctrl_c_quits() {
        let keys = KeyBindings::default();
        let event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(keys.action_for(&event), Some(Action::Quit));
        assert_eq!(keys.action_for(&press(KeyCode::Char('c'))), None);
    }

    #[test]
    fn overrides_replace_default_keys() {
        let overrides = HashMap::from([(Action::HardDrop, vec!["space".to_string()])]);
        let keys = KeyBindings::with_overrides(&overrides).unwrap();
        assert_eq!(keys.action_for(&press(KeyCode::Char(' '))), Some(Action::HardDrop));
        assert_eq!(keys.action_for(&press(KeyCode::Char('z'))), None);
        assert_eq!(keys.keys_for(Action::HardDrop), vec!["Space".to_string()]);
    }

    #[test]
    fn overridden_key_leaves_its_default_action() {
        let overrides = HashMap::from([(Action::Pause, vec!["q".to_string()])]);
        let keys = KeyBindings::with_overrides(&overrides).unwrap();
        assert_eq!(keys.action_for(&press(KeyCode::Char('q'))), Some(Action::Pause));
        assert_eq!(keys.action_for(&press(KeyCode::Esc)), Some(Action::Quit));
        assert_eq!(keys.action_for(&press(KeyCode::Enter)), None);
    }

    #[test]
    fn same_key_for_two_actions_is_rejected() {
        let overrides = HashMap::from([
            (Action::HardDrop, vec!["space".to_string()]),
            (Action::Pause, vec!["Space".to_string()]),
        ]);
        let err = KeyBindings::with_overrides(&overrides).unwrap_err();
        match err {
            KeyBindingError::Duplicate { key, first, second } => {
                assert_eq!(key, "Space");
                let mut actions = [first, second];
                actions.sort_by_key(|action| action.label());
                assert_eq!(actions, [Action::HardDrop, Action::Pause]);
            }
            other => panic!("expected a duplicate key error, got {other:?}"),
        }
    }

    #[test]
    fn repeated_key_for_one_action_is_accepted() {
        let overrides = HashMap::from([(Action::Pause, vec!["p".to_string(), "P".to_string()])]);
        let keys = KeyBindings::with_overrides(&overrides).unwrap();
        assert_eq!(keys.keys_for(Action::Pause), vec!["P".to_string()]);
    }

    #[test]
    fn unknown_key_names_are_rejected() {
        assert_eq!(parse_key_name("Escape"), Ok(KeyCode::Esc));
        assert_eq!(parse_key_name("k"), Ok(KeyCode::Char('k')));
        assert!(parse_key_name("hyper").is_err());
        assert!(parse_key_name("").is_err());
    }
}
