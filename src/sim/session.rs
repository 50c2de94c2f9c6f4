/// Session: the complete state of one play-through.
///
/// Owns the grid store, the box registry, the level template and the
/// mode flags. Everything that used to be process-wide lives here and is
/// passed explicitly; the main loop is the only owner.
///
/// ## Lifecycle
///   - `install_level` replaces the template (and with it the next-level name)
///   - `load_level` reads a file and installs it only if it parses
///   - `start` / `respawn` rebuild grid, overlay and boxes from the template
///   - `step` moves the player, recomputes the frame, applies win/death

use std::path::Path;

use tracing::{debug, info};

use crate::domain::boxes::{BoxRegistry, CapacityError};
use crate::domain::entity::MoveDir;
use crate::domain::grid::{Grid, GridStore};
use crate::domain::physics::{self, BoxFate};
use crate::domain::rules::{self, Verdict};
use crate::sim::event::GameEvent;
use crate::sim::level::{self, Level, LevelError};

#[derive(Clone, Debug)]
pub struct StepReport {
    pub events: Vec<GameEvent>,
    pub verdict: Verdict,
}

pub struct Session {
    pub store: GridStore,
    pub boxes: BoxRegistry,
    template: Level,

    // ── Flags ──
    /// false = noclip. Survives level loads.
    pub collision: bool,
    pub dead: bool,
    pub won: bool,
}

impl Session {
    pub fn new(template: Level, max_boxes: usize) -> Self {
        let store = GridStore::new(template.map.width(), template.map.height());
        Session {
            store,
            boxes: BoxRegistry::new(max_boxes),
            template,
            collision: true,
            dead: false,
            won: false,
        }
    }

    pub fn template(&self) -> &Level {
        &self.template
    }

    /// Name of the level to load after a win; empty when there is none.
    pub fn next_level(&self) -> &str {
        &self.template.next
    }

    /// Replace the level template wholesale. Takes effect on the next `start`.
    pub fn install_level(&mut self, level: Level) {
        debug!(next = %level.next, "level installed");
        self.template = level;
    }

    /// Read a level file and install it. On error nothing in the session
    /// changes. Takes effect on the next `start`.
    pub fn load_level(&mut self, path: &Path) -> Result<(), LevelError> {
        let level = level::load_file(path)?;
        self.install_level(level);
        Ok(())
    }

    /// Build the first frame from the template. Runs to completion before
    /// any input is read.
    pub fn start(&mut self) -> Result<(), CapacityError> {
        self.dead = false;
        self.won = false;
        self.store
            .reset_from_template(&self.template.map, &self.template.persist, &mut self.boxes)?;
        self.store.recompute_frame();
        info!(
            boxes = self.boxes.len(),
            limit = self.boxes.limit(),
            x = self.store.player.x,
            y = self.store.player.y,
            "session started"
        );
        Ok(())
    }

    /// Clear death/win and rebuild everything from the template.
    pub fn respawn(&mut self) -> Result<(), CapacityError> {
        info!("respawn");
        self.start()
    }

    pub fn toggle_noclip(&mut self) {
        self.collision = !self.collision;
        info!(noclip = !self.collision, "noclip toggled");
    }

    /// One movement keypress.
    pub fn step(&mut self, dir: MoveDir) -> StepReport {
        let mut events = Vec::new();
        let result = physics::resolve_step(&mut self.store, &mut self.boxes, dir, self.collision);

        if let Some(push) = result.push {
            events.push(GameEvent::BoxPushed { id: push.id, to: push.to });
            match push.fate {
                BoxFate::Consumed => events.push(GameEvent::BoxConsumed { id: push.id, at: push.to }),
                BoxFate::Vanished => events.push(GameEvent::BoxVanished { id: push.id, at: push.to }),
                BoxFate::Resting => {}
            }
            if push.fate != BoxFate::Resting && self.boxes.is_empty() {
                info!("last box gone");
            }
        }

        self.store.recompute_frame();

        if result.moved {
            events.push(GameEvent::PlayerMoved { to: self.store.player });
        } else {
            events.push(GameEvent::PlayerBlocked);
        }

        // Blocked steps count too: the player may already stand on a hazard.
        let verdict = rules::evaluate(self.store.tile_under_player(), self.collision);
        match verdict {
            Verdict::Win => {
                self.won = true;
                events.push(GameEvent::LevelWon { at: self.store.player });
            }
            Verdict::Death => {
                self.dead = true;
                events.push(GameEvent::PlayerKilled { at: self.store.player });
            }
            Verdict::Continue => {}
        }

        for event in &events {
            debug!(?event, "step event");
        }
        StepReport { events, verdict }
    }

    /// The transient grid and the registry, for box projection at draw time.
    pub fn frame_parts(&mut self) -> (&mut Grid, &BoxRegistry) {
        (&mut self.store.frame, &self.boxes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::Pos;
    use crate::domain::tile::Tile;
    use crate::sim::level::embedded_default;

    fn level(map: &[&str]) -> Level {
        let map = Grid::from_rows(map);
        let persist = Grid::new(map.width(), map.height());
        Level { map, persist, next: String::new() }
    }

    fn started(map: &[&str]) -> Session {
        let mut s = Session::new(level(map), 15);
        s.start().unwrap();
        s
    }

    #[test]
    fn goal_wins_with_collision() {
        let mut s = started(&["@P."]);
        let report = s.step(MoveDir::Right);
        assert_eq!(report.verdict, Verdict::Win);
        assert!(s.won);
        assert!(report.events.contains(&GameEvent::LevelWon { at: Pos::new(1, 0) }));
    }

    #[test]
    fn goal_ignored_in_noclip() {
        let mut s = started(&["@P."]);
        s.toggle_noclip();
        let report = s.step(MoveDir::Right);
        assert_eq!(report.verdict, Verdict::Continue);
        assert!(!s.won);
        assert_eq!(s.store.player, Pos::new(1, 0));
    }

    #[test]
    fn hazard_kills() {
        let mut s = started(&["@ ."]);
        s.step(MoveDir::Right);
        assert!(s.dead);
        assert!(!s.won);
    }

    #[test]
    fn blocked_step_reports_and_keeps_flags() {
        let mut s = started(&["@#."]);
        let report = s.step(MoveDir::Right);
        assert_eq!(report.events, vec![GameEvent::PlayerBlocked]);
        assert!(!s.dead && !s.won);
    }

    #[test]
    fn blocked_step_on_hazard_kills() {
        let mut s = started(&["@_#"]);
        s.toggle_noclip();
        s.step(MoveDir::Right);
        assert!(!s.dead);
        s.toggle_noclip();
        let report = s.step(MoveDir::Right);
        assert_eq!(s.store.player, Pos::new(1, 0));
        assert_eq!(report.verdict, Verdict::Death);
        assert!(s.dead);
        assert_eq!(report.events[0], GameEvent::PlayerBlocked);
        assert!(report.events.contains(&GameEvent::PlayerKilled { at: Pos::new(1, 0) }));
    }

    #[test]
    fn consumed_box_emits_events() {
        let mut s = started(&["@%_."]);
        let report = s.step(MoveDir::Right);
        assert!(report.events.contains(&GameEvent::BoxConsumed { id: 0, at: Pos::new(2, 0) }));
        assert_eq!(s.store.frame.get(2, 0), Some(Tile::Floor));
        assert!(!s.dead);
    }

    #[test]
    fn respawn_restores_boxes_and_clears_flags() {
        let mut s = started(&["@%_ "]);
        s.step(MoveDir::Right);
        assert!(s.boxes.is_empty());
        s.step(MoveDir::Right);
        s.step(MoveDir::Right);
        assert!(s.dead);

        s.respawn().unwrap();
        assert!(!s.dead);
        assert_eq!(s.store.player, Pos::new(0, 0));
        assert!(s.boxes.find_at(1, 0).is_some());
        assert_eq!(s.store.frame.get(2, 0), Some(Tile::HazardConsuming));
    }

    #[test]
    fn respawn_without_spawn_uses_center() {
        let mut s = started(&["...", "...", "..."]);
        s.step(MoveDir::Up);
        s.respawn().unwrap();
        assert_eq!(s.store.player, Pos::new(1, 1));
    }

    #[test]
    fn install_leaves_running_state_alone() {
        let mut s = started(&["@%."]);
        s.step(MoveDir::Right);
        let mut next = level(&["..@"]);
        next.next = "three".to_string();
        s.install_level(next);
        assert_eq!(s.store.player, Pos::new(1, 0));
        assert_eq!(s.next_level(), "three");
        s.start().unwrap();
        assert_eq!(s.store.player, Pos::new(2, 0));
        assert!(s.boxes.is_empty());
    }

    #[test]
    fn noclip_survives_level_change() {
        let mut s = Session::new(embedded_default(), 15);
        s.start().unwrap();
        s.toggle_noclip();
        s.install_level(embedded_default());
        s.start().unwrap();
        assert!(!s.collision);
    }

    #[test]
    fn malformed_file_leaves_session_untouched() {
        use crate::sim::level::serialize;

        let mut s = Session::new(embedded_default(), 15);
        s.start().unwrap();
        s.step(MoveDir::Left);

        let mut other = embedded_default();
        other.next = "elsewhere".to_string();
        let text = serialize(&other);
        // One tile short in the first map row.
        let broken = text.replacen("..................#.............\n", "..................#............\n", 1);
        let path = std::env::temp_dir().join(format!("pushbox-session-short-{}.map", std::process::id()));
        std::fs::write(&path, broken).unwrap();

        let template = s.template().clone();
        let frame = s.store.frame.clone();
        let player = s.store.player;
        let boxes: Vec<Pos> = s.boxes.iter().map(|b| b.pos).collect();

        let result = s.load_level(&path);
        let _ = std::fs::remove_file(&path);

        assert!(matches!(result, Err(LevelError::Malformed(_))));
        assert_eq!(s.template(), &template);
        assert_eq!(s.store.frame, frame);
        assert_eq!(s.store.player, player);
        assert_eq!(s.boxes.iter().map(|b| b.pos).collect::<Vec<_>>(), boxes);
        assert_eq!(s.next_level(), "");
    }

    #[test]
    fn valid_file_is_installed_for_next_start() {
        let mut other = embedded_default();
        other.next = "after".to_string();
        let path = std::env::temp_dir().join(format!("pushbox-session-ok-{}.map", std::process::id()));
        crate::sim::level::save_file(&path, &other).unwrap();

        let mut s = Session::new(embedded_default(), 15);
        s.start().unwrap();
        s.step(MoveDir::Left);
        let result = s.load_level(&path);
        let _ = std::fs::remove_file(&path);

        assert!(result.is_ok());
        assert_eq!(s.next_level(), "after");
        assert_eq!(s.store.player, Pos::new(20, 8));
        s.start().unwrap();
        assert_eq!(s.store.player, Pos::new(21, 8));
    }

    #[test]
    fn start_fails_when_level_has_too_many_boxes() {
        let mut s = Session::new(level(&["%%%"]), 2);
        assert!(s.start().is_err());
    }

    #[test]
    fn embedded_level_starts() {
        let mut s = Session::new(embedded_default(), 15);
        s.start().unwrap();
        assert_eq!(s.store.player, Pos::new(21, 8));
        assert_eq!(s.boxes.len(), 2);
        assert_eq!(s.store.frame.get(19, 0), Some(Tile::PersistentWall));
    }
}
