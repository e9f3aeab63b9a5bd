//! Application-level configuration loading.

use std::{
    collections::HashMap,
    env, fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};

use crate::{
    input::{
        Action,
        buttons::{ButtonScheme, DEFAULT_CHORD_WINDOW},
        keyboard::KeyBindings,
    },
    state::{
        board::{MAX_GRID_HEIGHT, MIN_GRID_HEIGHT},
        game::GameSettings,
    },
};

/// Default location on disk where the game looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/fruitris.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FRUITRIS_CONFIG_PATH";
/// Environment variable that disables the terminal frontend.
const HEADLESS_ENV: &str = "FRUITRIS_HEADLESS";
/// Default save file, mirroring the Fruit Jam's `/saves` folder.
const DEFAULT_SAVE_PATH: &str = "saves/fruitris.txt";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub game: GameSettings,
    /// Where the high score is saved; `None` keeps it in memory.
    pub save_path: Option<PathBuf>,
    /// Restart immediately after a top out instead of waiting for input.
    pub auto_restart: bool,
    pub button_scheme: ButtonScheme,
    pub chord_window: Duration,
    pub keys: KeyBindings,
    pub server: ServerConfig,
    /// Directory receiving the log file while the terminal UI owns the screen.
    pub log_dir: PathBuf,
    /// Run without the terminal UI (server only).
    pub headless: bool,
}

/// Settings of the controller / spectator HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    /// Load the configuration from disk and the environment, falling back to defaults.
    ///
    /// Nothing is logged here; the returned [`ConfigOrigin`] is logged once tracing is up.
    pub fn load() -> (Self, ConfigOrigin) {
        let (mut config, origin) = Self::load_from(&resolve_config_path());
        config.apply_env();
        (config, origin)
    }

    /// Read the JSON file at `path`, using defaults when it is missing or invalid.
    pub fn load_from(path: &Path) -> (Self, ConfigOrigin) {
        let path = path.to_path_buf();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => (config, ConfigOrigin::File(path)),
                Err(error) => (Self::default(), ConfigOrigin::Fallback { path, error }),
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                (Self::default(), ConfigOrigin::Missing(path))
            }
            Err(err) => (
                Self::default(),
                ConfigOrigin::Fallback {
                    path,
                    error: ConfigError::Io(err),
                },
            ),
        }
    }

    /// Parse a JSON document; absent fields keep their defaults.
    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let raw = serde_json::from_str::<RawConfig>(contents)?;
        raw.try_into()
    }

    fn apply_env(&mut self) {
        if let Some(port) = env::var("PORT")
            .or_else(|_| env::var("SERVER_PORT"))
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        if let Ok(value) = env::var(HEADLESS_ENV) {
            self.headless = is_truthy(&value);
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            game: GameSettings::default(),
            save_path: Some(PathBuf::from(DEFAULT_SAVE_PATH)),
            auto_restart: true,
            button_scheme: ButtonScheme::default(),
            chord_window: DEFAULT_CHORD_WINDOW,
            keys: KeyBindings::default(),
            server: ServerConfig::default(),
            log_dir: PathBuf::from("logs"),
            headless: false,
        }
    }
}

/// Where the running configuration came from.
#[derive(Debug)]
pub enum ConfigOrigin {
    /// Parsed from the file at this path.
    File(PathBuf),
    /// No file at this path; built-in defaults are used.
    Missing(PathBuf),
    /// The file could not be used; built-in defaults are used instead.
    Fallback { path: PathBuf, error: ConfigError },
}

impl ConfigOrigin {
    /// Report how the configuration was obtained.
    pub fn log(&self) {
        match self {
            ConfigOrigin::File(path) => info!(path = %path.display(), "loaded configuration"),
            ConfigOrigin::Missing(path) => info!(
                path = %path.display(),
                "config file not found; using built-in defaults"
            ),
            ConfigOrigin::Fallback { path, error } => warn!(
                path = %path.display(),
                error = %error,
                "failed to load config; falling back to defaults"
            ),
        }
    }
}

/// Reasons a configuration document is rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unreadable file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("board_height must be between {MIN_GRID_HEIGHT} and {MAX_GRID_HEIGHT} (got {0})")]
    BoardHeight(usize),
    #[error("start_level must be at least 1")]
    StartLevel,
    #[error(transparent)]
    Key(#[from] crate::input::keyboard::KeyBindingError),
}

#[serde_as]
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    board_height: Option<usize>,
    start_level: Option<u32>,
    initial_high_score: Option<u32>,
    /// `null` disables saving; absent keeps the default path.
    #[serde(deserialize_with = "deserialize_some")]
    save_path: Option<Option<PathBuf>>,
    auto_restart: Option<bool>,
    button_scheme: Option<ButtonScheme>,
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    chord_window_ms: Option<Duration>,
    keyboard: HashMap<Action, Vec<String>>,
    server: Option<RawServer>,
    log_dir: Option<PathBuf>,
    seed: Option<u64>,
    headless: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
/// JSON representation of the `server` section.
struct RawServer {
    #[serde(default = "default_true")]
    enabled: bool,
    port: Option<u16>,
}

impl TryFrom<RawConfig> for AppConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        let defaults = AppConfig::default();

        let board_height = raw.board_height.unwrap_or(defaults.game.board_height);
        if !(MIN_GRID_HEIGHT..=MAX_GRID_HEIGHT).contains(&board_height) {
            return Err(ConfigError::BoardHeight(board_height));
        }
        let start_level = raw.start_level.unwrap_or(defaults.game.start_level);
        if start_level == 0 {
            return Err(ConfigError::StartLevel);
        }

        let keys = if raw.keyboard.is_empty() {
            defaults.keys
        } else {
            KeyBindings::with_overrides(&raw.keyboard)?
        };

        let server = match raw.server {
            Some(server) => ServerConfig {
                enabled: server.enabled,
                port: server.port.unwrap_or(DEFAULT_PORT),
            },
            None => defaults.server,
        };

        Ok(Self {
            game: GameSettings {
                board_height,
                start_level,
                initial_high_score: raw
                    .initial_high_score
                    .unwrap_or(defaults.game.initial_high_score),
                seed: raw.seed,
            },
            save_path: raw.save_path.unwrap_or(defaults.save_path),
            auto_restart: raw.auto_restart.unwrap_or(defaults.auto_restart),
            button_scheme: raw.button_scheme.unwrap_or(defaults.button_scheme),
            chord_window: raw.chord_window_ms.unwrap_or(defaults.chord_window),
            keys,
            server,
            log_dir: raw.log_dir.unwrap_or(defaults.log_dir),
            headless: raw.headless.unwrap_or(defaults.headless),
        })
    }
}

/// Distinguish an explicit `null` from an absent field.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn default_true() -> bool {
    true
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.game, GameSettings::default());
        assert_eq!(config.save_path, Some(PathBuf::from(DEFAULT_SAVE_PATH)));
        assert_eq!(config.button_scheme, ButtonScheme::Revised);
        assert_eq!(config.chord_window, DEFAULT_CHORD_WINDOW);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn full_document_is_applied() {
        let config = AppConfig::from_json(
            r#"{
                "board_height": 26,
                "start_level": 3,
                "initial_high_score": 10000,
                "auto_restart": false,
                "button_scheme": "original",
                "chord_window_ms": 80,
                "keyboard": { "hard_drop": ["space"] },
                "server": { "enabled": false, "port": 9000 },
                "seed": 5
            }"#,
        )
        .unwrap();

        assert_eq!(config.game.board_height, 26);
        assert_eq!(config.game.start_level, 3);
        assert_eq!(config.game.initial_high_score, 10000);
        assert_eq!(config.game.seed, Some(5));
        assert!(!config.auto_restart);
        assert_eq!(config.button_scheme, ButtonScheme::Original);
        assert_eq!(config.chord_window, Duration::from_millis(80));
        assert_eq!(
            config.server,
            ServerConfig {
                enabled: false,
                port: 9000
            }
        );
        let space = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(config.keys.action_for(&space), Some(Action::HardDrop));
    }

    #[test]
    fn null_save_path_disables_saving() {
        let config = AppConfig::from_json(r#"{ "save_path": null }"#).unwrap();
        assert_eq!(config.save_path, None);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            AppConfig::from_json(r#"{ "board_height": 2 }"#),
            Err(ConfigError::BoardHeight(2))
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{ "start_level": 0 }"#),
            Err(ConfigError::StartLevel)
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{ "keyboard": { "pause": ["hyper"] } }"#),
            Err(ConfigError::Key(_))
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{ "colour": "red" }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fruitris.json");

        let (config, origin) = AppConfig::load_from(&path);
        assert_eq!(config.game, GameSettings::default());
        assert!(matches!(origin, ConfigOrigin::Missing(p) if p == path));
    }

    #[test]
    fn misspelled_key_falls_back_with_the_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fruitris.json");
        fs::write(&path, r#"{ "board_hieght": 26 }"#).unwrap();

        let (config, origin) = AppConfig::load_from(&path);
        assert_eq!(config.game.board_height, GameSettings::default().board_height);
        match origin {
            ConfigOrigin::Fallback { path: p, error } => {
                assert_eq!(p, path);
                assert!(matches!(error, ConfigError::Json(_)));
                assert!(error.to_string().contains("board_hieght"));
            }
            other => panic!("expected a fallback, got {other:?}"),
        }
    }

    #[test]
    fn valid_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fruitris.json");
        fs::write(&path, r#"{ "board_height": 26 }"#).unwrap();

        let (config, origin) = AppConfig::load_from(&path);
        assert_eq!(config.game.board_height, 26);
        assert!(matches!(origin, ConfigOrigin::File(_)));
    }

    #[test]
    fn truthy_values() {
        assert!(is_truthy("1"));
        assert!(is_truthy(" TRUE "));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }
}
