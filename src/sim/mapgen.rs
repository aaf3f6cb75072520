/// Map generation: an all-dirt grid seeded with gold.
///
/// Gold is placed by rejection sampling: pick a random cell, keep it only
/// if it is still Dirt. Every cell is equally likely and no cell gets two
/// nuggets.

use rand::Rng;

use crate::domain::entity::Position;
use crate::domain::grid::Grid;
use crate::domain::tile::Tile;

/// Freshly generated map plus the win threshold.
pub struct GeneratedMap {
    pub grid: Grid,
    pub gold_total: usize,
}

pub fn generate<R: Rng + ?Sized>(rng: &mut R, cols: usize, rows: usize, gold_count: usize) -> GeneratedMap {
    let mut grid = Grid::filled(cols, rows, Tile::Dirt);
    let target = gold_count.min(cols * rows);

    let mut placed = 0;
    while placed < target {
        let pos = Position::new(rng.gen_range(0..cols), rng.gen_range(0..rows));
        if grid.get(pos) == Some(Tile::Dirt) {
            grid.set(pos, Tile::Gold);
            placed += 1;
        }
    }

    let gold_total = grid.count(Tile::Gold);
    GeneratedMap { grid, gold_total }
}
