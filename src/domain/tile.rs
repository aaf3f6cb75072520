/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Dirt,  // Diggable, becomes Empty when the player enters
    Empty, // Dug out, enemies may walk here
    Gold,  // Pickup target
}

impl Tile {
    /// Can an enemy step onto this tile?
    pub fn is_walkable(self) -> bool {
        matches!(self, Tile::Empty)
    }

    /// Does the player turn this tile into Empty on entry?
    pub fn is_diggable(self) -> bool {
        matches!(self, Tile::Dirt | Tile::Gold)
    }

    /// Is this a gold pickup?
    pub fn is_gold(self) -> bool {
        matches!(self, Tile::Gold)
    }

    /// Character used in test diagrams.
    #[cfg(test)]
    pub fn glyph(self) -> char {
        match self {
            Tile::Dirt => '#',
            Tile::Empty => ' ',
            Tile::Gold => '$',
        }
    }

    #[cfg(test)]
    pub fn from_glyph(ch: char) -> Option<Tile> {
        match ch {
            '#' => Some(Tile::Dirt),
            ' ' | '.' => Some(Tile::Empty),
            '$' => Some(Tile::Gold),
            _ => None,
        }
    }
}
