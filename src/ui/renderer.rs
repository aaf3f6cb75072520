/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each grid tile is `CELL_W` terminal columns wide, so the drawing
/// surface for the map is `cols * CELL_W` by `rows`.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::Position;
use crate::error::Result;
use crate::sim::world::{Phase, Session};
use super::sprites::{self, Look, Sprite};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_BG: Color = Color::Rgb { r: 0, g: 0, b: 0 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Write a string centered within `[x0, x0 + span)`.
    fn put_centered(&mut self, x0: usize, span: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        self.put_str(x0 + span.saturating_sub(len) / 2, y, s, fg, bg);
    }
}

// ── Layout ──

/// Terminal columns per grid tile.
const CELL_W: usize = 2;

const BANNER: [&str; 4] = [
    r"  ___  ___  _    ___    ___  ___  ___  ___  ___  ___ ",
    r" / __|/ _ \| |  |   \  |   \|_ _|/ __|/ __|| __|| _ \",
    r"| (_ | (_) | |__| |) | | |) || || (_ || (_ || _| |   /",
    r" \___|\___/|____|___/  |___/|___|\___|\___||___||_|_\",
];
const BANNER_ROW: usize = 0;
const TAGLINE_ROW: usize = 4;
const HUD_ROW: usize = 6;
const MAP_ROW: usize = 8;

const GOLD_TEXT: Color = Color::Rgb { r: 255, g: 215, b: 0 };
const WIN_TEXT: Color = Color::Rgb { r: 0, g: 255, b: 0 };
const LOSE_TEXT: Color = Color::Rgb { r: 255, g: 0, b: 0 };
const BORDER: Color = Color::Rgb { r: 0x44, g: 0x44, b: 0x44 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    look: Look,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new(look: Look) -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
            look,
            enhanced_keys: false,
        }
    }

    /// Enter raw mode and the alternate screen.
    /// Returns whether the terminal reports key releases.
    pub fn init(&mut self) -> Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        self.enhanced_keys = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if self.enhanced_keys {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn render(&mut self, session: &Session, now_ms: u64) -> Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.invalidate()?;
        }

        // Phase change → clear for clean transition
        if self.last_phase != Some(session.phase) {
            self.invalidate()?;
            self.last_phase = Some(session.phase);
        }

        self.compose(session, now_ms);
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    fn invalidate(&mut self) -> io::Result<()> {
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, s: &Session, now_ms: u64) {
        self.front.clear();
        let map_w = s.grid.cols() * CELL_W;

        self.compose_header(map_w);
        self.compose_hud(s);
        self.compose_border(map_w, s.grid.rows());

        match s.phase {
            Phase::Running => self.compose_map(s, now_ms),
            Phase::Won | Phase::Lost => self.compose_banner(s),
        }

        let help_row = MAP_ROW + s.grid.rows() + 1;
        let help = match s.phase {
            Phase::Running => " ←↑↓→ / WASD: Dig   Esc/Q: Quit",
            _ => " R / Enter: Play again   Esc/Q: Quit",
        };
        self.front.put_str(0, help_row, help, Color::DarkGrey, Cell::BASE_BG);
    }

    /// Title art standing in for the header image, plus the tagline.
    fn compose_header(&mut self, map_w: usize) {
        let width = map_w.max(BANNER[0].len());
        for (i, line) in BANNER.iter().enumerate() {
            self.front.put_centered(0, width, BANNER_ROW + i, line, GOLD_TEXT, Cell::BASE_BG);
        }
        self.front.put_centered(
            0, width, TAGLINE_ROW,
            "Use arrow keys to dig through dirt!",
            Color::Grey, Cell::BASE_BG,
        );
    }

    fn compose_hud(&mut self, s: &Session) {
        let hud = format!(
            " Gold collected: {} / {}   Enemies: {}/{}   Round {}",
            s.score, s.gold_total, s.enemies.len(), s.rules.max_enemies, s.round,
        );
        self.front.put_str(0, HUD_ROW, &hud, GOLD_TEXT, Cell::BASE_BG);

        let status = match s.phase {
            Phase::Running => return,
            Phase::Won => ("You win!", WIN_TEXT),
            Phase::Lost => ("You were caught!", LOSE_TEXT),
        };
        let x = hud.chars().count() + 2;
        self.front.put_str(x, HUD_ROW, status.0, status.1, Cell::BASE_BG);
    }

    /// Frame line just below the map, the canvas border.
    fn compose_border(&mut self, map_w: usize, rows: usize) {
        for x in 0..map_w {
            self.front.set(x, MAP_ROW - 1, Cell::new('▁', BORDER, Cell::BASE_BG));
            self.front.set(x, MAP_ROW + rows, Cell::new('▔', BORDER, Cell::BASE_BG));
        }
    }

    fn compose_map(&mut self, s: &Session, now_ms: u64) {
        let frame = sprites::frame_index(now_ms, s.speed.anim_frame_ms);

        for y in 0..s.grid.rows() {
            for (x, &tile) in s.grid.row(y).iter().enumerate() {
                let sprite = self.look.tile(tile);
                self.put_sprite(Position::new(x, y), sprite);
            }
        }

        // Enemies are offset by id so they don't animate in lockstep.
        for enemy in &s.enemies {
            let sprite = self.look.enemy(frame + enemy.id);
            self.put_sprite(enemy.pos, sprite);
        }

        let sprite = self.look.player(frame, s.player.facing);
        self.put_sprite(s.player.pos, sprite);
    }

    fn put_sprite(&mut self, pos: Position, sprite: Sprite) {
        let col = pos.x * CELL_W;
        let row = MAP_ROW + pos.y;
        self.front.set(col, row, Cell::new(sprite.glyph[0], sprite.fg, sprite.bg));
        self.front.set(col + 1, row, Cell::new(sprite.glyph[1], sprite.fg, sprite.bg));
    }

    /// Terminal state: the map area is blank apart from a centered message.
    fn compose_banner(&mut self, s: &Session) {
        let map_w = s.grid.cols() * CELL_W;
        let rows = s.grid.rows();
        for y in 0..rows {
            for x in 0..map_w {
                self.front.set(x, MAP_ROW + y, Cell::new(' ', Color::White, Cell::BASE_BG));
            }
        }

        let (text, color) = match s.phase {
            Phase::Won => ("YOU WIN!", WIN_TEXT),
            _ => ("GAME OVER", LOSE_TEXT),
        };
        let mid = MAP_ROW + rows / 2;
        self.front.put_centered(0, map_w, mid - 1, text, color, Cell::BASE_BG);

        let score = format!("Gold collected: {} / {}", s.score, s.gold_total);
        self.front.put_centered(0, map_w, mid + 1, &score, Color::White, Cell::BASE_BG);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Enemy;
    use crate::domain::grid::Grid;
    use crate::domain::tile::Tile;
    use crate::ui::sprites::{Tileset, FLAT_DIRT, FLAT_PLAYER};

    fn renderer(look: Look) -> Renderer {
        let mut r = Renderer::new(look);
        r.front.resize(80, 40);
        r.back.resize(80, 40);
        r
    }

    fn row_text(r: &Renderer, y: usize) -> String {
        (0..r.front.width).map(|x| r.front.get(x, y).ch).collect()
    }

    fn session() -> Session {
        let grid = Grid::from_rows(&[
            "############",
            "#  $########",
            "############",
        ]);
        Session::from_grid(grid, Position::new(1, 1), 3)
    }

    #[test]
    fn running_draws_tiles_and_player() {
        let mut r = renderer(Look::Flat);
        let s = session();
        r.compose(&s, 0);

        let dirt = r.front.get(0, MAP_ROW);
        assert_eq!(dirt.bg, FLAT_DIRT);
        let player = r.front.get(CELL_W, MAP_ROW + 1);
        assert_eq!(player.bg, FLAT_PLAYER);
        assert!(row_text(&r, HUD_ROW).contains("Gold collected: 0 / 1"));
    }

    #[test]
    fn enemy_drawn_over_floor() {
        let mut r = renderer(Look::Sprites(Tileset::builtin().unwrap()));
        let mut s = session();
        s.enemies.push(Enemy::new(0, Position::new(2, 1)));
        r.compose(&s, 0);
        let cell = r.front.get(2 * CELL_W, MAP_ROW + 1);
        assert_eq!(cell.ch, '◉');
    }

    #[test]
    fn player_animates_over_time() {
        let mut r = renderer(Look::Sprites(Tileset::builtin().unwrap()));
        let s = session();
        let frame_ms = s.speed.anim_frame_ms;
        let mut seen = vec![];
        for i in 0..3 {
            r.compose(&s, i * frame_ms);
            seen.push(r.front.get(CELL_W + 1, MAP_ROW + 1).ch);
        }
        assert_eq!(seen, vec!['╱', '─', '╲']);
    }

    #[test]
    fn terminal_phase_replaces_grid_with_banner() {
        let mut r = renderer(Look::Flat);
        let mut s = session();
        s.phase = Phase::Lost;
        r.compose(&s, 0);
        let mid = MAP_ROW + s.grid.rows() / 2;
        assert!(row_text(&r, mid - 1).contains("GAME OVER"));
        assert!(row_text(&r, HUD_ROW).contains("You were caught!"));
        // No tile colors left in the map area.
        assert_ne!(r.front.get(0, MAP_ROW).bg, FLAT_DIRT);

        s.phase = Phase::Won;
        s.score = 1;
        r.compose(&s, 0);
        assert!(row_text(&r, mid - 1).contains("YOU WIN!"));
        assert!(row_text(&r, mid + 1).contains("Gold collected: 1 / 1"));
    }

    #[test]
    fn header_is_drawn() {
        let mut r = renderer(Look::Flat);
        let mut s = session();
        s.grid.set(Position::new(0, 0), Tile::Empty);
        r.compose(&s, 0);
        assert!(row_text(&r, TAGLINE_ROW).contains("Use arrow keys to dig through dirt!"));
        assert!(row_text(&r, BANNER_ROW + 1).contains("/ __|"));
    }
}
