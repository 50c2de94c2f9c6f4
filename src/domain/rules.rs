/// Win / death rules.
///
/// Pure classification of the tile under the player after a step.
/// Noclip bypasses both checks.
///
/// ┌──────────────────────┬───────────┐
/// │ Tile under player     │ Verdict   │
/// ├──────────────────────┼───────────┤
/// │ Goal                  │ Win       │
/// │ HazardConsuming       │ Death     │
/// │ HazardSilent          │ Death     │
/// │ Anything else         │ Continue  │
/// └──────────────────────┴───────────┘

use crate::domain::tile::Tile;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verdict {
    Continue,
    Win,
    Death,
}

pub fn evaluate(under_player: Tile, collision: bool) -> Verdict {
    if !collision {
        return Verdict::Continue;
    }
    match under_player {
        Tile::Goal => Verdict::Win,
        t if t.is_hazard() => Verdict::Death,
        _ => Verdict::Continue,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_wins_only_with_collision() {
        assert_eq!(evaluate(Tile::Goal, true), Verdict::Win);
        assert_eq!(evaluate(Tile::Goal, false), Verdict::Continue);
    }

    #[test]
    fn hazards_kill() {
        assert_eq!(evaluate(Tile::HazardConsuming, true), Verdict::Death);
        assert_eq!(evaluate(Tile::HazardSilent, true), Verdict::Death);
        assert_eq!(evaluate(Tile::HazardSilent, false), Verdict::Continue);
    }

    #[test]
    fn ordinary_tiles_continue() {
        for t in [Tile::Floor, Tile::Player, Tile::Wall, Tile::Other('x')] {
            assert_eq!(evaluate(t, true), Verdict::Continue);
        }
    }
}
