/// Entities: Player and Enemy, plus the input shape that drives them.
/// Both are plain grid positions; the session owns them and only the
/// step function mutates them.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

/// Integer grid coordinate. `x` is the column, `y` the row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Neighbor at `(dx, dy)`, or None if it would leave `cols × rows`.
    pub fn offset(self, dx: i32, dy: i32, cols: usize, rows: usize) -> Option<Position> {
        let nx = self.x as i64 + dx as i64;
        let ny = self.y as i64 + dy as i64;
        if nx < 0 || ny < 0 || nx >= cols as i64 || ny >= rows as i64 {
            return None;
        }
        Some(Position::new(nx as usize, ny as usize))
    }
}

/// Cardinal directions tried by wandering enemies (up, down, left, right).
pub const DIRS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// Held movement keys sampled for one tick.
/// Each axis is evaluated independently, so two keys give a diagonal
/// and opposite keys cancel out.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct HeldDirs {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl HeldDirs {
    #[cfg(test)]
    pub const NONE: HeldDirs = HeldDirs { up: false, down: false, left: false, right: false };

    /// Net `(dx, dy)` of all held keys.
    pub fn delta(self) -> (i32, i32) {
        let mut dx = 0;
        let mut dy = 0;
        if self.up { dy -= 1; }
        if self.down { dy += 1; }
        if self.left { dx -= 1; }
        if self.right { dx += 1; }
        (dx, dy)
    }

    /// Merge two input sources (keyboard + gamepad).
    pub fn union(self, other: HeldDirs) -> HeldDirs {
        HeldDirs {
            up: self.up || other.up,
            down: self.down || other.down,
            left: self.left || other.left,
            right: self.right || other.right,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Position,
    pub facing: Facing,
}

impl Player {
    pub fn new(x: usize, y: usize) -> Self {
        Player {
            pos: Position::new(x, y),
            facing: Facing::Right,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub id: usize,
    pub pos: Position,
}

impl Enemy {
    pub fn new(id: usize, pos: Position) -> Self {
        Enemy { id, pos }
    }
}
