/// Events emitted during a simulation step.
/// The main loop consumes these for logging and status messages.

use crate::domain::entity::Pos;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PlayerMoved { to: Pos },
    PlayerBlocked,
    BoxPushed { id: usize, to: Pos },
    BoxConsumed { id: usize, at: Pos },
    BoxVanished { id: usize, at: Pos },
    PlayerKilled { at: Pos },
    LevelWon { at: Pos },
}
