/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Tile {
    Floor,
    Wall,             // Blocks player and box
    PersistentWall,   // Blocks box only
    HazardConsuming,  // Eats a box once, then turns to floor
    HazardSilent,     // Eats boxes, never changes
    Player,
    Box,              // Render-time projection only
    Goal,
    EditorCursor,     // Editor overlay, never persisted
    Other(char),      // Any other glyph the editor wrote
}

impl Tile {
    pub fn from_char(c: char) -> Tile {
        match c {
            '.' => Tile::Floor,
            '#' => Tile::Wall,
            '=' => Tile::PersistentWall,
            '_' => Tile::HazardConsuming,
            ' ' => Tile::HazardSilent,
            '@' => Tile::Player,
            '%' => Tile::Box,
            'P' => Tile::Goal,
            '!' => Tile::EditorCursor,
            other => Tile::Other(other),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Tile::Floor           => '.',
            Tile::Wall            => '#',
            Tile::PersistentWall  => '=',
            Tile::HazardConsuming => '_',
            Tile::HazardSilent    => ' ',
            Tile::Player          => '@',
            Tile::Box             => '%',
            Tile::Goal            => 'P',
            Tile::EditorCursor    => '!',
            Tile::Other(c)        => c,
        }
    }

    /// Either hazard kind.
    pub fn is_hazard(self) -> bool {
        matches!(self, Tile::HazardConsuming | Tile::HazardSilent)
    }

    /// Can a pushed box come to rest here?
    pub fn accepts_box(self) -> bool {
        matches!(self, Tile::Floor | Tile::HazardConsuming | Tile::HazardSilent)
    }

    /// Does this tile stop the player (collision mode only)?
    pub fn blocks_player(self) -> bool {
        matches!(self, Tile::Wall)
    }

    /// Walls survive frame recomputation.
    pub fn is_wall(self) -> bool {
        matches!(self, Tile::Wall | Tile::PersistentWall)
    }

    /// Tiles the recomputation never touches, so the evaluator can still
    /// see what the player is standing on.
    pub fn is_sticky(self) -> bool {
        matches!(self, Tile::HazardConsuming | Tile::HazardSilent | Tile::Goal)
    }
}

impl Default for Tile {
    fn default() -> Self {
        Tile::Floor
    }
}
