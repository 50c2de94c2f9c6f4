/// Box registry: the bounded set of live boxes.
///
/// Boxes are the source of truth for box positions. The grid only shows
/// a box glyph after the renderer projects the registry onto it.
///
/// Registry order carries no meaning: removal swaps the last box into
/// the freed slot.

use crate::domain::entity::{Pos, PushBox};

pub const DEFAULT_MAX_BOXES: usize = 15;

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("box limit of {limit} exceeded while spawning at ({x}, {y})")]
pub struct CapacityError {
    pub limit: usize,
    pub x: usize,
    pub y: usize,
}

#[derive(Clone, Debug)]
pub struct BoxRegistry {
    boxes: Vec<PushBox>,
    limit: usize,
    next_id: usize,
}

impl BoxRegistry {
    pub fn new(limit: usize) -> Self {
        BoxRegistry {
            boxes: Vec::with_capacity(limit),
            limit,
            next_id: 0,
        }
    }

    /// Add a box. Exceeding the limit is an authoring error in the level.
    pub fn spawn(&mut self, x: usize, y: usize) -> Result<usize, CapacityError> {
        if self.boxes.len() >= self.limit {
            return Err(CapacityError { limit: self.limit, x, y });
        }
        let id = self.next_id;
        self.next_id += 1;
        self.boxes.push(PushBox::new(id, x, y));
        Ok(id)
    }

    pub fn find_at(&self, x: usize, y: usize) -> Option<&PushBox> {
        self.boxes.iter().find(|b| b.pos == Pos::new(x, y))
    }

    pub fn find_at_mut(&mut self, x: usize, y: usize) -> Option<&mut PushBox> {
        self.boxes.iter_mut().find(|b| b.pos == Pos::new(x, y))
    }

    /// Remove the box at (x, y), if any. O(n), order not preserved.
    pub fn remove_at(&mut self, x: usize, y: usize) -> Option<PushBox> {
        let idx = self.boxes.iter().position(|b| b.pos == Pos::new(x, y))?;
        Some(self.boxes.swap_remove(idx))
    }

    /// Drop every box and restart ids. Called on each level (re)load.
    pub fn reset(&mut self) {
        self.boxes.clear();
        self.next_id = 0;
    }

    pub fn iter(&self) -> impl Iterator<Item = &PushBox> {
        self.boxes.iter()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for BoxRegistry {
    fn default() -> Self {
        BoxRegistry::new(DEFAULT_MAX_BOXES)
    }
}
