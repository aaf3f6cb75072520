/// Sprite atlas: what each tile and actor looks like on screen.
///
/// A tileset is a small TOML file (see `assets/tileset.toml`, which is also
/// compiled in as the built-in atlas). Every sprite covers one grid cell,
/// i.e. two terminal columns. Player and enemy have three frames each,
/// cycled by elapsed time.
///
/// If sprites are disabled or an external atlas fails to load, the
/// renderer draws flat colors per cell type instead.

use std::path::Path;

use crossterm::style::Color;
use serde::Deserialize;

use crate::config::GameConfig;
use crate::domain::entity::Facing;
use crate::domain::tile::Tile;
use crate::error::{GameError, TilesetError};

pub const ANIM_FRAMES: usize = 3;

const BUILTIN: &str = include_str!("../../assets/tileset.toml");

/// One cell's worth of drawing: two glyphs plus colors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Sprite {
    pub glyph: [char; 2],
    pub fg: Color,
    pub bg: Color,
}

impl Sprite {
    pub const fn flat(bg: Color) -> Self {
        Sprite { glyph: [' ', ' '], fg: Color::White, bg }
    }

    /// Mirror for a left-facing actor.
    pub fn mirrored(self) -> Self {
        let flip = |c: char| match c {
            '╱' => '╲',
            '╲' => '╱',
            '<' => '>',
            '>' => '<',
            '(' => ')',
            ')' => '(',
            other => other,
        };
        Sprite {
            glyph: [flip(self.glyph[1]), flip(self.glyph[0])],
            ..self
        }
    }
}

#[derive(Clone, Debug)]
pub struct Tileset {
    pub name: String,
    pub dirt: Sprite,
    pub empty: Sprite,
    pub gold: Sprite,
    pub player: [Sprite; ANIM_FRAMES],
    pub enemy: [Sprite; ANIM_FRAMES],
}

/// How the renderer draws cells: from an atlas, or flat colors.
#[derive(Clone, Debug)]
pub enum Look {
    Sprites(Tileset),
    Flat,
}

// ── Flat palette ──

pub const FLAT_DIRT: Color = Color::Rgb { r: 0x65, g: 0x43, b: 0x21 };
pub const FLAT_GOLD: Color = Color::Rgb { r: 0xff, g: 0xd7, b: 0x00 };
pub const FLAT_EMPTY: Color = Color::Rgb { r: 0x11, g: 0x11, b: 0x11 };
pub const FLAT_ENEMY: Color = Color::Red;
pub const FLAT_PLAYER: Color = Color::Yellow;

impl Look {
    pub fn tile(&self, tile: Tile) -> Sprite {
        match self {
            Look::Sprites(ts) => match tile {
                Tile::Dirt => ts.dirt,
                Tile::Empty => ts.empty,
                Tile::Gold => ts.gold,
            },
            Look::Flat => Sprite::flat(match tile {
                Tile::Dirt => FLAT_DIRT,
                Tile::Empty => FLAT_EMPTY,
                Tile::Gold => FLAT_GOLD,
            }),
        }
    }

    pub fn player(&self, frame: usize, facing: Facing) -> Sprite {
        match self {
            Look::Sprites(ts) => {
                let s = ts.player[frame % ANIM_FRAMES];
                if facing == Facing::Left { s.mirrored() } else { s }
            }
            Look::Flat => Sprite::flat(FLAT_PLAYER),
        }
    }

    /// Enemy sprite; flat mode draws a red inset on the empty floor.
    pub fn enemy(&self, frame: usize) -> Sprite {
        match self {
            Look::Sprites(ts) => ts.enemy[frame % ANIM_FRAMES],
            Look::Flat => Sprite { glyph: ['▐', '▌'], fg: FLAT_ENEMY, bg: FLAT_EMPTY },
        }
    }
}

/// Frame number for an animation that started at 0 ms.
pub fn frame_index(elapsed_ms: u64, frame_ms: u64) -> usize {
    ((elapsed_ms / frame_ms.max(1)) % ANIM_FRAMES as u64) as usize
}

// ── TOML schema ──

#[derive(Deserialize, Debug)]
struct TomlSprite {
    glyph: String,
    #[serde(default)]
    fg: Option<String>,
    #[serde(default)]
    bg: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TomlTileset {
    #[serde(default)]
    name: String,
    dirt: TomlSprite,
    empty: TomlSprite,
    gold: TomlSprite,
    player: Vec<TomlSprite>,
    enemy: Vec<TomlSprite>,
}

// ── Loading ──

impl Tileset {
    pub fn builtin() -> Result<Self, TilesetError> {
        Tileset::parse(BUILTIN)
    }

    pub fn load(path: &Path) -> Result<Self, TilesetError> {
        let text = std::fs::read_to_string(path).map_err(|source| TilesetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Tileset::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, TilesetError> {
        let raw: TomlTileset = toml::from_str(text)?;
        Ok(Tileset {
            name: raw.name,
            dirt: sprite("dirt", &raw.dirt)?,
            empty: sprite("empty", &raw.empty)?,
            gold: sprite("gold", &raw.gold)?,
            player: frames("player", &raw.player)?,
            enemy: frames("enemy", &raw.enemy)?,
        })
    }
}

/// Pick the look from config: flat if sprites are off, else the
/// configured atlas (or built-in), falling back to flat on any error.
pub fn resolve_look(config: &GameConfig) -> Look {
    if !config.sprites {
        log::info!("sprites disabled, drawing flat colors");
        return Look::Flat;
    }
    let loaded = match &config.tileset {
        Some(path) => Tileset::load(path),
        None => Tileset::builtin(),
    };
    match loaded {
        Ok(ts) => {
            log::debug!("using tileset `{}`", ts.name);
            Look::Sprites(ts)
        }
        Err(e) => {
            log::warn!("{}; drawing flat colors", GameError::from(e));
            Look::Flat
        }
    }
}

fn sprite(name: &str, raw: &TomlSprite) -> Result<Sprite, TilesetError> {
    let mut chars = raw.glyph.chars();
    let glyph = [chars.next().unwrap_or(' '), chars.next().unwrap_or(' ')];
    let fg = match &raw.fg {
        Some(v) => parse_color(name, v)?,
        None => Color::White,
    };
    let bg = match &raw.bg {
        Some(v) => parse_color(name, v)?,
        None => FLAT_EMPTY,
    };
    Ok(Sprite { glyph, fg, bg })
}

fn frames(name: &str, raw: &[TomlSprite]) -> Result<[Sprite; ANIM_FRAMES], TilesetError> {
    if raw.len() != ANIM_FRAMES {
        return Err(TilesetError::FrameCount {
            sprite: name.to_string(),
            expected: ANIM_FRAMES,
            found: raw.len(),
        });
    }
    Ok([sprite(name, &raw[0])?, sprite(name, &raw[1])?, sprite(name, &raw[2])?])
}

fn parse_color(sprite: &str, value: &str) -> Result<Color, TilesetError> {
    let bad = || TilesetError::Color { sprite: sprite.to_string(), value: value.to_string() };

    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(bad());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
        return Ok(Color::Rgb { r: byte(0)?, g: byte(2)?, b: byte(4)? });
    }

    let named = match value.to_ascii_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "grey" | "gray" => Color::Grey,
        "darkgrey" | "darkgray" => Color::DarkGrey,
        "gold" => FLAT_GOLD,
        "lime" => Color::Rgb { r: 0x32, g: 0xcd, b: 0x32 },
        _ => return Err(bad()),
    };
    Ok(named)
}
