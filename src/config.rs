/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tick_rate_ms: u64,
    pub session: SessionTuning,
    pub seed: Option<u64>,
    pub gamepad: GamepadConfig,
    pub log_file: Option<PathBuf>,
}

/// Gameplay constants for one session.
/// Distances are world units, rates are per tick, times are seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionTuning {
    pub time_budget: f32,
    pub spawn_interval: f32,
    pub animation_interval: f32,
    pub move_speed: f32,
    pub jump_impulse: f32,
    pub fall_speed: f32,
    pub spin_rate: f32,
    pub max_fall_distance: f32,
    pub spawn_point: (f32, f32),
}

impl Default for SessionTuning {
    fn default() -> Self {
        SessionTuning {
            time_budget: default_time_budget(),
            spawn_interval: default_spawn_interval(),
            animation_interval: 0.2,
            move_speed: 5.0,
            jump_impulse: 10.0,
            fall_speed: 5.0,
            spin_rate: 2.0,
            max_fall_distance: 300.0,
            spawn_point: (130.0, 120.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub pause: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    session: TomlSession,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlSession {
    #[serde(default = "default_time_budget")]
    time_budget: f32,
    #[serde(default = "default_spawn_interval")]
    spawn_interval: f32,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_jump")]
    jump: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    log_file: Option<String>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }     // ~60 ticks per second
fn default_time_budget() -> f32 { 30.0 }
fn default_spawn_interval() -> f32 { 1.0 }

fn default_jump() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_pause() -> Vec<String> { vec!["Start".into()] }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlSession {
    fn default() -> Self {
        TomlSession {
            time_budget: default_time_budget(),
            spawn_interval: default_spawn_interval(),
            seed: None,
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_jump(),
            confirm: default_confirm(),
            cancel: default_cancel(),
            pause: default_pause(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg)
    }

    /// Parse config text directly (no file search).
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(Self::from_toml)
    }

    fn from_toml(toml_cfg: TomlConfig) -> Self {
        let mut session = SessionTuning::default();

        if toml_cfg.session.time_budget.is_finite() && toml_cfg.session.time_budget > 0.0 {
            session.time_budget = toml_cfg.session.time_budget;
        } else {
            eprintln!("Warning: session.time_budget must be a positive number, using {}", session.time_budget);
        }
        if toml_cfg.session.spawn_interval.is_finite() && toml_cfg.session.spawn_interval > 0.0 {
            session.spawn_interval = toml_cfg.session.spawn_interval;
        } else {
            eprintln!("Warning: session.spawn_interval must be a positive number, using {}", session.spawn_interval);
        }

        GameConfig {
            tick_rate_ms: toml_cfg.timing.tick_rate_ms.max(1),
            session,
            seed: toml_cfg.session.seed,
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                pause: toml_cfg.gamepad.pause,
            },
            log_file: toml_cfg.general.log_file.map(PathBuf::from),
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so a linked binary still finds its config.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            return read_toml(&path);
        }
    }
    TomlConfig::default()
}

fn read_toml(path: &Path) -> TomlConfig {
    match std::fs::read_to_string(path) {
        Ok(text) => match toml::from_str::<TomlConfig>(&text) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Warning: config.toml parse error: {e}");
                eprintln!("Using default settings.");
                TomlConfig::default()
            }
        },
        Err(e) => {
            eprintln!("Warning: could not read {}: {e}", path.display());
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        assert_eq!(cfg.tick_rate_ms, 16);
        assert_eq!(cfg.session, SessionTuning::default());
        assert_eq!(cfg.seed, None);
        assert!(cfg.log_file.is_none());
        assert_eq!(cfg.gamepad.cancel, vec!["Select".to_string()]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse(
            "[session]\ntime_budget = 45.0\nseed = 7\n\n[general]\nlog_file = \"catch.log\"\n",
        ).unwrap();
        assert_eq!(cfg.session.time_budget, 45.0);
        assert_eq!(cfg.session.spawn_interval, 1.0);
        assert_eq!(cfg.seed, Some(7));
        assert_eq!(cfg.log_file, Some(PathBuf::from("catch.log")));
        assert_eq!(cfg.tick_rate_ms, 16);
    }

    #[test]
    fn non_positive_timings_are_rejected() {
        let cfg = GameConfig::parse(
            "[session]\ntime_budget = 0.0\nspawn_interval = -1.0\n[timing]\ntick_rate_ms = 0\n",
        ).unwrap();
        assert_eq!(cfg.session.time_budget, 30.0);
        assert_eq!(cfg.session.spawn_interval, 1.0);
        assert_eq!(cfg.tick_rate_ms, 1);
    }

    #[test]
    fn non_finite_timings_are_rejected() {
        let cfg = GameConfig::parse("[session]\ntime_budget = inf\nspawn_interval = nan\n").unwrap();
        assert_eq!(cfg.session.time_budget, 30.0);
        assert_eq!(cfg.session.spawn_interval, 1.0);
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let cfg = GameConfig::parse(include_str!("../config.toml")).unwrap();
        assert_eq!(cfg.session, SessionTuning::default());
        assert_eq!(cfg.tick_rate_ms, 16);
        assert_eq!(cfg.gamepad.jump, vec!["A".to_string(), "B".to_string()]);
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(GameConfig::parse("[session\n").is_err());
    }
}
