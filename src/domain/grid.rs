/// Grid store: two parallel tile layers plus the player coordinate.
///
/// ## Layers
///
///   - `frame`:   the transient grid. Re-derived every tick by
///                 `recompute_frame()`, written in place by the movement
///                 resolver (consumed hazards) and by the renderer
///                 (box projection, undone by the next recompute).
///   - `overlay`: permanent level geometry. Any non-floor overlay cell
///                 is stamped onto `frame` on every recompute.
///
/// Boxes are never stored here between frames; see `BoxRegistry`.

use crate::domain::boxes::{BoxRegistry, CapacityError};
use crate::domain::entity::Pos;
use crate::domain::tile::Tile;

pub const ROWS: usize = 11;
pub const COLS: usize = 32;

/// Fixed-size tile board. Dimensions are set once at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Tile>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Grid {
            width,
            height,
            cells: vec![Tile::Floor; width * height],
        }
    }

    /// Standard level-sized grid.
    pub fn standard() -> Self {
        Grid::new(COLS, ROWS)
    }

    /// Build a grid from text rows. Width is taken from the longest row;
    /// short rows are padded with floor.
    pub fn from_rows(rows: &[&str]) -> Self {
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
        let mut grid = Grid::new(width, rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                grid.set(x, y, Tile::from_char(ch));
            }
        }
        grid
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Tile> {
        if self.in_bounds(x, y) {
            Some(self.cells[y * self.width + x])
        } else {
            None
        }
    }

    /// Write a tile. Out-of-bounds writes are dropped.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, tile: Tile) {
        if self.in_bounds(x, y) {
            self.cells[y * self.width + x] = tile;
        }
    }

    pub fn fill(&mut self, tile: Tile) {
        self.cells.fill(tile);
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        self.cells.chunks(self.width.max(1)).take(self.height)
    }

    /// Row-major text, every row terminated by `\n`.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.height * (self.width + 1));
        for row in self.rows() {
            out.extend(row.iter().map(|t| t.to_char()));
            out.push('\n');
        }
        out
    }

    pub fn center(&self) -> Pos {
        Pos::new(self.width / 2, self.height / 2)
    }
}

/// Structural equality; used to skip redundant redraws.
pub fn frames_equal(a: &Grid, b: &Grid) -> bool {
    a == b
}

#[derive(Clone, Debug)]
pub struct GridStore {
    pub frame: Grid,
    pub overlay: Grid,
    pub player: Pos,
}

impl GridStore {
    pub fn new(width: usize, height: usize) -> Self {
        let frame = Grid::new(width, height);
        let player = frame.center();
        GridStore {
            overlay: Grid::new(width, height),
            frame,
            player,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.frame.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Rebuild both layers and the box registry from a level template.
    ///
    /// The player starts at the template's `@`, or the grid centre when the
    /// template has none. Every `%` becomes a registry box on floor.
    pub fn reset_from_template(
        &mut self,
        map: &Grid,
        persist: &Grid,
        boxes: &mut BoxRegistry,
    ) -> Result<(), CapacityError> {
        self.frame.fill(Tile::Floor);
        self.overlay.fill(Tile::Floor);
        boxes.reset();
        self.player = self.frame.center();

        for y in 0..self.height().min(map.height()) {
            for x in 0..self.width().min(map.width()) {
                let tile = map.get(x, y).unwrap_or_default();
                match tile {
                    Tile::Player => {
                        self.player = Pos::new(x, y);
                        self.frame.set(x, y, tile);
                    }
                    Tile::Box => {
                        boxes.spawn(x, y)?;
                    }
                    _ => self.frame.set(x, y, tile),
                }
            }
        }

        for y in 0..self.height().min(persist.height()) {
            for x in 0..self.width().min(persist.width()) {
                let tile = persist.get(x, y).unwrap_or_default();
                self.overlay.set(x, y, tile);
            }
        }
        self.stamp_overlay();
        Ok(())
    }

    /// Re-derive the transient grid from overlay, player and prior walls.
    ///
    /// Per cell, first match wins:
    ///   overlay non-floor → overlay tile
    ///   hazard / goal     → kept
    ///   player position  → `@`
    ///   wall              → kept
    ///   anything else     → floor
    ///
    /// Does not consult the box registry.
    pub fn recompute_frame(&mut self) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                let persist = self.overlay.get(x, y).unwrap_or_default();
                if persist != Tile::Floor {
                    self.frame.set(x, y, persist);
                    continue;
                }
                let current = self.frame.get(x, y).unwrap_or_default();
                if current.is_sticky() {
                    continue;
                }
                if self.player == Pos::new(x, y) {
                    self.frame.set(x, y, Tile::Player);
                } else if !current.is_wall() {
                    self.frame.set(x, y, Tile::Floor);
                }
            }
        }
    }

    /// What the player is standing on in the current frame.
    pub fn tile_under_player(&self) -> Tile {
        self.frame.get(self.player.x, self.player.y).unwrap_or_default()
    }

    fn stamp_overlay(&mut self) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                let persist = self.overlay.get(x, y).unwrap_or_default();
                if persist != Tile::Floor {
                    self.frame.set(x, y, persist);
                }
            }
        }
    }
}
