/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing or incomplete.
/// Physics defaults are the tuned values the levels were built against.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub physics: PhysicsConfig,
    pub player: PlayerConfig,
    pub timing: TimingConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub scores_file: PathBuf,
    pub log_file: PathBuf,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: f64,
    pub terminal_velocity: f64,
    pub jump_coefficient: f64,
    /// Charge-time cap in seconds; also the largest jump power.
    pub max_jump_power: f64,
    pub jump_kick: f64,
    pub wall_bounce: f64,
    pub ice_decay: f64,
    pub hitbox_shrink: i32,
    /// Steps off the ground before wall bounce and the jump pose kick in.
    pub jump_air_grace: u32,
    pub footstep_interval: u32,
    pub footstep_variants: u32,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub size: (i32, i32),
    pub start: (f64, f64),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub fps: u32,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub pause: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            gravity: 0.1,
            terminal_velocity: 5.0,
            jump_coefficient: 4.5,
            max_jump_power: 0.8,
            jump_kick: 2.0,
            wall_bounce: 1.8,
            ice_decay: 0.2,
            hitbox_shrink: 5,
            jump_air_grace: 4,
            footstep_interval: 18,
            footstep_variants: 3,
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig { size: (16, 28), start: (1.0, 200.0) }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig { fps: 60 }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        GamepadConfig {
            jump: vec!["A".into(), "B".into()],
            pause: vec!["Start".into()],
            confirm: vec!["A".into(), "Start".into()],
            cancel: vec!["Select".into()],
            restart: vec!["Y".into()],
        }
    }
}

// ── TOML Schema ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    physics: PhysicsConfig,
    #[serde(default)]
    player: PlayerConfig,
    #[serde(default)]
    timing: TimingConfig,
    #[serde(default)]
    gamepad: GamepadConfig,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
struct TomlGeneral {
    levels_dir: String,
    scores_file: String,
    log_file: String,
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: "levels".into(),
            scores_file: "ranking.tsv".into(),
            log_file: "frosthop.log".into(),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg, &search_dirs)
    }

    /// Parse config text directly (no directory search for paths).
    #[allow(dead_code)]
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg: TomlConfig = toml::from_str(text)?;
        Ok(Self::resolve(toml_cfg, &[]))
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir = resolve_dir(&toml_cfg.general.levels_dir, search_dirs);
        let mut physics = toml_cfg.physics;
        if physics.footstep_interval == 0 {
            warn!("footstep_interval must be positive; using default");
            physics.footstep_interval = PhysicsConfig::default().footstep_interval;
        }
        let mut timing = toml_cfg.timing;
        if timing.fps == 0 {
            warn!("fps must be positive; using default");
            timing.fps = TimingConfig::default().fps;
        }

        GameConfig {
            physics,
            player: toml_cfg.player,
            timing,
            gamepad: toml_cfg.gamepad,
            levels_dir,
            scores_file: PathBuf::from(toml_cfg.general.scores_file),
            log_file: PathBuf::from(toml_cfg.general.log_file),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::resolve(TomlConfig::default(), &[])
    }
}

/// Absolute paths are used as-is; relative ones are looked up in the
/// candidate dirs and default to CWD-relative.
fn resolve_dir(dir: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = Path::new(dir);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    search_dirs
        .iter()
        .map(|d| d.join(dir))
        .find(|p| p.is_dir())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/frosthop)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/frosthop");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
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
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "config_parse_failed; using defaults");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "config_read_failed");
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_tuned_defaults() {
        let cfg = GameConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.physics, PhysicsConfig::default());
        assert_eq!(cfg.physics.jump_coefficient, 4.5);
        assert_eq!(cfg.physics.max_jump_power, 0.8);
        assert_eq!(cfg.player.size, (16, 28));
        assert_eq!(cfg.timing.fps, 60);
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            "[physics]\nice_decay = 0.05\n\n[general]\nscores_file = \"scores.tsv\"\n",
        )
        .unwrap();
        assert_eq!(cfg.physics.ice_decay, 0.05);
        assert_eq!(cfg.physics.wall_bounce, 1.8);
        assert_eq!(cfg.scores_file, PathBuf::from("scores.tsv"));
        assert_eq!(cfg.log_file, PathBuf::from("frosthop.log"));
    }

    #[test]
    fn zero_fps_falls_back() {
        let cfg = GameConfig::from_toml_str("[timing]\nfps = 0\n").unwrap();
        assert_eq!(cfg.timing.fps, 60);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(GameConfig::from_toml_str("[physics]\ngravity = \"lots\"\n").is_err());
    }
}
