/// Entities: the player position, pushable boxes, and movement directions.
/// The player is a bare coordinate; boxes carry an id so logs can follow them.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }
}

/// Movement direction (one keypress = one step)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Up,
    Left,
    Down,
    Right,
}

pub const ALL_DIRS: [MoveDir; 4] = [MoveDir::Up, MoveDir::Left, MoveDir::Down, MoveDir::Right];

impl MoveDir {
    /// Unit vector as (dx, dy). Screen coordinates: y grows downward.
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Up    => (0, -1),
            MoveDir::Left  => (-1, 0),
            MoveDir::Down  => (0, 1),
            MoveDir::Right => (1, 0),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PushBox {
    pub id: usize,
    pub pos: Pos,
}

impl PushBox {
    pub fn new(id: usize, x: usize, y: usize) -> Self {
        PushBox { id, pos: Pos::new(x, y) }
    }
}
