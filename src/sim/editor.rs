/// Level editor: a cursor over the two layers of a level template.
///
/// The editor works on its own copy of the template. Nothing reaches the
/// session until the caller commits `level()` (save) or hands it to the
/// codec (export).

use crate::domain::entity::{MoveDir, Pos};
use crate::domain::grid::Grid;
use crate::domain::physics::offset_clamped;
use crate::domain::tile::Tile;
use crate::sim::level::Level;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Layer {
    Map,
    Persist,
}

impl Layer {
    pub fn name(self) -> &'static str {
        match self {
            Layer::Map => "Regular",
            Layer::Persist => "Persist",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Editor {
    level: Level,
    pub cursor: Pos,
    pub layer: Layer,
}

impl Editor {
    pub fn open(template: &Level) -> Self {
        Editor {
            cursor: template.map.center(),
            level: template.clone(),
            layer: Layer::Map,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    /// The layer currently being edited.
    pub fn active(&self) -> &Grid {
        match self.layer {
            Layer::Map => &self.level.map,
            Layer::Persist => &self.level.persist,
        }
    }

    /// Move the cursor one cell, stopping at the edges.
    pub fn move_cursor(&mut self, dir: MoveDir) {
        let grid = self.active();
        if let Some(p) = offset_clamped(self.cursor, dir, grid.width(), grid.height()) {
            self.cursor = p;
        }
    }

    pub fn toggle_layer(&mut self) {
        self.layer = match self.layer {
            Layer::Map => Layer::Persist,
            Layer::Persist => Layer::Map,
        };
    }

    /// Overwrite the tile under the cursor. Control characters and the
    /// cursor glyph itself are ignored.
    pub fn write(&mut self, ch: char) {
        let tile = Tile::from_char(ch);
        if ch.is_control() || tile == Tile::EditorCursor {
            return;
        }
        let Pos { x, y } = self.cursor;
        let grid = match self.layer {
            Layer::Map => &mut self.level.map,
            Layer::Persist => &mut self.level.persist,
        };
        grid.set(x, y, tile);
    }

    pub fn set_next(&mut self, name: String) {
        self.level.next = name;
    }
}
