/// Grid: the fixed-size tile array a session digs through.
///
/// Stored row-major (`cells[y][x]`). Dimensions are fixed at construction;
/// only tile values change afterwards. Out-of-bounds reads return `None`
/// and out-of-bounds writes are ignored, so callers never index past the
/// edge by accident.

use super::entity::Position;
use super::tile::Tile;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: Vec<Vec<Tile>>,
    cols: usize,
    rows: usize,
}

impl Grid {
    /// A `cols × rows` grid filled with `fill`.
    pub fn filled(cols: usize, rows: usize, fill: Tile) -> Self {
        Grid {
            cells: vec![vec![fill; cols]; rows],
            cols,
            rows,
        }
    }

    /// Build a grid from a string diagram, one string per row.
    /// Legend: '#'=Dirt  '$'=Gold  ' ' or '.'=Empty. Unknown chars are Dirt.
    #[cfg(test)]
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = Grid::filled(width, height, Tile::Dirt);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                grid.cells[y][x] = Tile::from_glyph(ch).unwrap_or(Tile::Dirt);
            }
        }
        grid
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x < self.cols && pos.y < self.rows
    }

    #[inline]
    pub fn get(&self, pos: Position) -> Option<Tile> {
        if self.in_bounds(pos) {
            Some(self.cells[pos.y][pos.x])
        } else {
            None
        }
    }

    #[inline]
    pub fn set(&mut self, pos: Position, tile: Tile) {
        if self.in_bounds(pos) {
            self.cells[pos.y][pos.x] = tile;
        }
    }

    /// Clamp an arbitrary signed coordinate into the grid.
    pub fn clamp(&self, x: i64, y: i64) -> Position {
        let cx = x.clamp(0, self.cols.saturating_sub(1) as i64);
        let cy = y.clamp(0, self.rows.saturating_sub(1) as i64);
        Position::new(cx as usize, cy as usize)
    }

    pub fn count(&self, tile: Tile) -> usize {
        self.cells.iter().flatten().filter(|&&t| t == tile).count()
    }

    /// All positions holding `tile`, in row-major order.
    pub fn positions_of(&self, tile: Tile) -> Vec<Position> {
        let mut out = Vec::new();
        for (y, row) in self.cells.iter().enumerate() {
            for (x, &t) in row.iter().enumerate() {
                if t == tile {
                    out.push(Position::new(x, y));
                }
            }
        }
        out
    }

    pub fn row(&self, y: usize) -> &[Tile] {
        &self.cells[y]
    }
}
