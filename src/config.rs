/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::GameError;

pub const MIN_COLS: usize = 12;
pub const MAX_COLS: usize = 25;
pub const MIN_ROWS: usize = 12;
pub const MAX_ROWS: usize = 18;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub grid: GridConfig,
    pub speed: SpeedConfig,
    pub gamepad: GamepadConfig,
    /// External sprite atlas; None = built-in.
    pub tileset: Option<PathBuf>,
    /// false = draw flat colors instead of sprites.
    pub sprites: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridConfig {
    pub cols: usize,
    pub rows: usize,
    pub gold_count: usize,
    pub max_enemies: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeedConfig {
    pub frame_sleep_ms: u64,
    pub player_move_ms: u64, // min gap between player steps
    pub enemy_spawn_ms: u64, // gap between spawn attempts
    pub enemy_move_ms: u64,  // gap between enemy wander steps
    pub anim_frame_ms: u64,  // duration of one sprite frame
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
}

impl Default for GridConfig {
    fn default() -> Self {
        GridConfig {
            cols: default_cols(),
            rows: default_rows(),
            gold_count: default_gold_count(),
            max_enemies: default_max_enemies(),
        }
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        SpeedConfig {
            frame_sleep_ms: default_frame_sleep(),
            player_move_ms: default_player_move(),
            enemy_spawn_ms: default_enemy_spawn(),
            enemy_move_ms: default_enemy_move(),
            anim_frame_ms: default_anim_frame(),
        }
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    grid: TomlGrid,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlGrid {
    #[serde(default = "default_cols")]
    cols: usize,
    #[serde(default = "default_rows")]
    rows: usize,
    #[serde(default = "default_gold_count")]
    gold_count: usize,
    #[serde(default = "default_max_enemies")]
    max_enemies: usize,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_frame_sleep")]
    frame_sleep_ms: u64,
    #[serde(default = "default_player_move")]
    player_move_ms: u64,
    #[serde(default = "default_enemy_spawn")]
    enemy_spawn_ms: u64,
    #[serde(default = "default_enemy_move")]
    enemy_move_ms: u64,
    #[serde(default = "default_anim_frame")]
    anim_frame_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    tileset: String,
    #[serde(default = "default_sprites")]
    sprites: bool,
}

// ── Defaults ──

fn default_cols() -> usize { 25 }
fn default_rows() -> usize { 18 }
fn default_gold_count() -> usize { 10 }
fn default_max_enemies() -> usize { 5 }

fn default_frame_sleep() -> u64 { 5 }
fn default_player_move() -> u64 { 120 }
fn default_enemy_spawn() -> u64 { 4000 }
fn default_enemy_move() -> u64 { 400 }
fn default_anim_frame() -> u64 { 150 }

fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_sprites() -> bool { true }

impl Default for TomlGrid {
    fn default() -> Self {
        TomlGrid {
            cols: default_cols(),
            rows: default_rows(),
            gold_count: default_gold_count(),
            max_enemies: default_max_enemies(),
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            frame_sleep_ms: default_frame_sleep(),
            player_move_ms: default_player_move(),
            enemy_spawn_ms: default_enemy_spawn(),
            enemy_move_ms: default_enemy_move(),
            anim_frame_ms: default_anim_frame(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            tileset: String::new(),
            sprites: default_sprites(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file, missing keys or a parse error fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let Some((path, text)) = read_config(&search_dirs) else {
            log::debug!("no config.toml found, using defaults");
            return GameConfig::from_toml(TomlConfig::default(), &search_dirs);
        };
        match GameConfig::parse(&text, &search_dirs) {
            Ok(cfg) => {
                log::debug!("loaded config from {}", path.display());
                cfg
            }
            Err(e) => {
                log::warn!("{}: {e}; using default settings", path.display());
                GameConfig::from_toml(TomlConfig::default(), &search_dirs)
            }
        }
    }

    /// Parse config text. Relative tileset paths resolve against
    /// `search_dirs`, or stay relative when it is empty.
    pub fn parse(text: &str, search_dirs: &[PathBuf]) -> Result<Self, GameError> {
        let toml_cfg: TomlConfig = toml::from_str(text)?;
        Ok(GameConfig::from_toml(toml_cfg, search_dirs))
    }

    fn from_toml(cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let cols = clamp_dim("cols", cfg.grid.cols, MIN_COLS, MAX_COLS);
        let rows = clamp_dim("rows", cfg.grid.rows, MIN_ROWS, MAX_ROWS);

        let gold_count = cfg.grid.gold_count.clamp(1, cols * rows);
        if gold_count != cfg.grid.gold_count {
            log::warn!("gold_count {} out of range 1..={}, using {}", cfg.grid.gold_count, cols * rows, gold_count);
        }

        let tileset = if cfg.general.tileset.is_empty() {
            None
        } else {
            Some(resolve_path(&cfg.general.tileset, search_dirs))
        };

        GameConfig {
            grid: GridConfig {
                cols,
                rows,
                gold_count,
                max_enemies: cfg.grid.max_enemies,
            },
            speed: SpeedConfig {
                frame_sleep_ms: cfg.speed.frame_sleep_ms,
                player_move_ms: cfg.speed.player_move_ms,
                enemy_spawn_ms: cfg.speed.enemy_spawn_ms,
                enemy_move_ms: cfg.speed.enemy_move_ms,
                anim_frame_ms: cfg.speed.anim_frame_ms.max(1),
            },
            gamepad: GamepadConfig {
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
            },
            tileset,
            sprites: cfg.general.sprites,
        }
    }
}

fn clamp_dim(name: &str, value: usize, min: usize, max: usize) -> usize {
    let clamped = value.clamp(min, max);
    if clamped != value {
        log::warn!("grid {name} = {value} out of range {min}..={max}, using {clamped}");
    }
    clamped
}

/// Absolute paths are kept; relative ones are looked up in the search dirs.
fn resolve_path(raw: &str, search_dirs: &[PathBuf]) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return path;
    }
    search_dirs.iter()
        .map(|d| d.join(raw))
        .find(|p| p.is_file())
        .unwrap_or(path)
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
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

/// First readable config.toml in the candidate directories.
fn read_config(search_dirs: &[PathBuf]) -> Option<(PathBuf, String)> {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => return Some((path, text)),
            Err(e) => log::warn!("could not read {}: {e}", path.display()),
        }
    }
    None
}
