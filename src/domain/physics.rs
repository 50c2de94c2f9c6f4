/// Movement resolver: one player step, with at most one box push.
///
/// ## Collision mode
///
/// ┌──────────────────────────────────────┬──────────────┐
/// │ Condition                             │ Result       │
/// ├──────────────────────────────────────┼──────────────┤
/// │ Destination off the board             │ BLOCKED      │
/// │ Box at destination, box target:       │              │
/// │   off the board                       │ BLOCKED      │
/// │   holds another box                   │ BLOCKED      │
/// │   not floor / hazard                  │ BLOCKED      │
/// │   floor / hazard                      │ box moves    │
/// │ Destination is Wall                   │ BLOCKED      │
/// │ Otherwise                             │ player moves │
/// └──────────────────────────────────────┴──────────────┘
///
/// A box landing on a consuming hazard turns it to floor and is removed.
/// A box landing on a silent hazard is removed; the tile stays.
///
/// ## Noclip mode
///
/// Every step succeeds and wraps at the board edges. Boxes and walls
/// are ignored.

use crate::domain::boxes::BoxRegistry;
use crate::domain::entity::{MoveDir, Pos};
use crate::domain::grid::GridStore;
use crate::domain::tile::Tile;

/// What happened to a pushed box once it landed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BoxFate {
    Resting,
    Consumed,
    Vanished,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Push {
    pub id: usize,
    pub from: Pos,
    pub to: Pos,
    pub fate: BoxFate,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct StepResult {
    pub moved: bool,
    pub push: Option<Push>,
}

/// Offset `pos` by `dir`, or `None` if that leaves the board.
pub fn offset_clamped(pos: Pos, dir: MoveDir, width: usize, height: usize) -> Option<Pos> {
    let (dx, dy) = dir.delta();
    let x = pos.x as i64 + dx as i64;
    let y = pos.y as i64 + dy as i64;
    if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
        None
    } else {
        Some(Pos::new(x as usize, y as usize))
    }
}

/// Offset `pos` by `dir`, wrapping around the board edges.
pub fn offset_wrapped(pos: Pos, dir: MoveDir, width: usize, height: usize) -> Pos {
    let (dx, dy) = dir.delta();
    let x = (pos.x as i64 + dx as i64).rem_euclid(width as i64);
    let y = (pos.y as i64 + dy as i64).rem_euclid(height as i64);
    Pos::new(x as usize, y as usize)
}

/// Resolve one player step. Mutates the player coordinate, the box
/// registry and (for consumed hazards) the transient grid.
pub fn resolve_step(
    store: &mut GridStore,
    boxes: &mut BoxRegistry,
    dir: MoveDir,
    collision: bool,
) -> StepResult {
    let (w, h) = (store.width(), store.height());

    if !collision {
        store.player = offset_wrapped(store.player, dir, w, h);
        return StepResult { moved: true, push: None };
    }

    let dest = match offset_clamped(store.player, dir, w, h) {
        Some(p) => p,
        None => return StepResult::default(),
    };

    let push = try_push(store, boxes, dest, dir);

    if store.frame.get(dest.x, dest.y).map_or(true, Tile::blocks_player) {
        return StepResult { moved: false, push };
    }
    if boxes.find_at(dest.x, dest.y).is_some() {
        return StepResult { moved: false, push };
    }

    store.player = dest;
    StepResult { moved: true, push }
}

/// Push the box at `at` one cell along `dir`, if there is one and the
/// target accepts it. Returns the push when the box moved.
fn try_push(store: &mut GridStore, boxes: &mut BoxRegistry, at: Pos, dir: MoveDir) -> Option<Push> {
    let id = boxes.find_at(at.x, at.y)?.id;
    let target = offset_clamped(at, dir, store.width(), store.height())?;

    // Single push only: a second box behind the first is a wall.
    if boxes.find_at(target.x, target.y).is_some() {
        return None;
    }
    let landing = store.frame.get(target.x, target.y)?;
    if !landing.accepts_box() {
        return None;
    }

    if let Some(b) = boxes.find_at_mut(at.x, at.y) {
        b.pos = target;
    }

    let fate = match landing {
        Tile::HazardConsuming => {
            store.frame.set(target.x, target.y, Tile::Floor);
            boxes.remove_at(target.x, target.y);
            BoxFate::Consumed
        }
        Tile::HazardSilent => {
            boxes.remove_at(target.x, target.y);
            BoxFate::Vanished
        }
        _ => BoxFate::Resting,
    };

    Some(Push { id, from: at, to: target, fate })
}
