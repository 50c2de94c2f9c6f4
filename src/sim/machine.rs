/// Screen flow as an explicit state machine.
///
/// `transition(phase, key)` is pure: it decides the next phase and the
/// side effect the main loop must carry out. The loop owns the session
/// and the editor and is the only place effects touch them.
///
/// ┌───────────┬──────────────────────┬───────────┬─────────────────┐
/// │ Phase      │ Input                 │ Next      │ Effect          │
/// ├───────────┼──────────────────────┼───────────┼─────────────────┤
/// │ MainMenu   │ 1 / 2 / 3             │ PlayMenu / Editor / Exit     │
/// │ PlayMenu   │ 1                     │ Gameplay  │ StartGameplay   │
/// │ PlayMenu   │ 2                     │ PlayMenu  │ PromptLoadLevel │
/// │ PlayMenu   │ 3, back               │ MainMenu  │ Redraw          │
/// │ Gameplay   │ move                  │ Gameplay  │ Step            │
/// │ Gameplay   │ respawn / noclip      │ Gameplay  │ Respawn / ToggleNoclip │
/// │ Gameplay   │ quit                  │ MainMenu  │ LeaveGameplay   │
/// │ Death/Win  │ respawn               │ Gameplay  │ Respawn         │
/// │ Death/Win  │ quit                  │ MainMenu  │ LeaveGameplay   │
/// │ Win        │ next (if named)       │ Gameplay  │ AdvanceLevel    │
/// │ Editor     │ move / layer / write  │ Editor    │ Editor*         │
/// │ Editor     │ quit                  │ MainMenu  │ LeaveEditor     │
/// └───────────┴──────────────────────┴───────────┴─────────────────┘
///
/// After a `Step` the loop calls `settle` to enter Death or Win. Effects
/// that hand control back carry a `Status`, and the status picks the
/// phase the loop continues in.

use crate::domain::entity::MoveDir;
use crate::sim::level::LevelError;
use crate::sim::session::Session;
use crate::ui::input::{Command, Key, Keymap};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    MainMenu,
    PlayMenu,
    Gameplay,
    Editor,
    Death,
    Win,
    Exit,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Effect {
    None,
    Redraw,
    Exit,
    StartGameplay,
    PromptLoadLevel,
    OpenEditor,
    Step(MoveDir),
    Respawn,
    ToggleNoclip,
    LeaveGameplay,
    AdvanceLevel,
    EditorCursor(MoveDir),
    EditorToggleLayer,
    EditorWrite(char),
    EditorSave,
    EditorExport,
    EditorSetNext,
    LeaveEditor,
}

/// Outcome codes reported back to the menus.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    ReturnToMenu,
    AdvanceToNextLevel,
    LevelNotFound,
    LevelMalformed,
    EditorQuit,
}

impl Status {
    /// Menu message for this status, if it warrants one.
    pub fn message(self) -> Option<&'static str> {
        match self {
            Status::LevelNotFound => Some("Map not found."),
            Status::LevelMalformed => Some("Map is malformed or corrupted."),
            Status::ReturnToMenu | Status::AdvanceToNextLevel | Status::EditorQuit => None,
        }
    }

    /// Where control lands once the status has been reported.
    pub fn next_phase(self) -> Phase {
        match self {
            Status::ReturnToMenu | Status::EditorQuit => Phase::MainMenu,
            Status::AdvanceToNextLevel => Phase::Gameplay,
            Status::LevelNotFound | Status::LevelMalformed => Phase::PlayMenu,
        }
    }
}

impl From<&LevelError> for Status {
    fn from(err: &LevelError) -> Self {
        match err {
            LevelError::NotFound { .. } => Status::LevelNotFound,
            LevelError::Malformed(_) | LevelError::Read { .. } | LevelError::Write { .. } => {
                Status::LevelMalformed
            }
        }
    }
}

impl Effect {
    /// Status code an effect reports when it hands control back.
    pub fn status(self) -> Option<Status> {
        match self {
            Effect::LeaveGameplay => Some(Status::ReturnToMenu),
            Effect::AdvanceLevel => Some(Status::AdvanceToNextLevel),
            Effect::LeaveEditor => Some(Status::EditorQuit),
            _ => None,
        }
    }
}

fn movement(cmd: Command) -> Option<MoveDir> {
    match cmd {
        Command::MoveUp => Some(MoveDir::Up),
        Command::MoveLeft => Some(MoveDir::Left),
        Command::MoveDown => Some(MoveDir::Down),
        Command::MoveRight => Some(MoveDir::Right),
        _ => None,
    }
}

fn step_effect(cmd: Command, wrap: fn(MoveDir) -> Effect) -> Effect {
    movement(cmd).map_or(Effect::None, wrap)
}

/// Decide the next phase and effect for one key.
/// `has_next` is whether the current level names a successor.
pub fn transition(phase: Phase, key: Key, keys: &Keymap, has_next: bool) -> (Phase, Effect) {
    if key == Key::Interrupt {
        return (Phase::Exit, Effect::Exit);
    }
    let ch = match key {
        Key::Char(c) => c,
        Key::Escape => '\u{1b}',
        Key::Backspace | Key::Interrupt => return (phase, Effect::None),
    };
    let cmd = keys.lookup(ch);

    match phase {
        Phase::MainMenu => match ch {
            '1' => (Phase::PlayMenu, Effect::Redraw),
            '2' => (Phase::Editor, Effect::OpenEditor),
            '3' => (Phase::Exit, Effect::Exit),
            _ => (phase, Effect::None),
        },

        Phase::PlayMenu => match (ch, cmd) {
            ('1', _) => (Phase::Gameplay, Effect::StartGameplay),
            ('2', _) => (phase, Effect::PromptLoadLevel),
            ('3', _) | (_, Some(Command::Back)) | ('\u{1b}', _) => (Phase::MainMenu, Effect::Redraw),
            _ => (phase, Effect::None),
        },

        Phase::Gameplay => match cmd {
            Some(c) if movement(c).is_some() => (phase, step_effect(c, Effect::Step)),
            Some(Command::Respawn) => (phase, Effect::Respawn),
            Some(Command::Quit) => (Phase::MainMenu, Effect::LeaveGameplay),
            Some(Command::ToggleNoclip) => (phase, Effect::ToggleNoclip),
            _ => (phase, Effect::None),
        },

        Phase::Death | Phase::Win => match cmd {
            Some(Command::Respawn) => (Phase::Gameplay, Effect::Respawn),
            Some(Command::Quit) => (Phase::MainMenu, Effect::LeaveGameplay),
            Some(Command::NextLevel) if phase == Phase::Win && has_next => {
                (Phase::Gameplay, Effect::AdvanceLevel)
            }
            _ => (phase, Effect::None),
        },

        Phase::Editor => match cmd {
            Some(c) if movement(c).is_some() => (phase, step_effect(c, Effect::EditorCursor)),
            Some(Command::SwitchLayer) => (phase, Effect::EditorToggleLayer),
            Some(Command::Quit) => (Phase::MainMenu, Effect::LeaveEditor),
            Some(Command::Save) => (phase, Effect::EditorSave),
            Some(Command::Export) => (phase, Effect::EditorExport),
            Some(Command::SetNextLevel) => (phase, Effect::EditorSetNext),
            _ if !ch.is_control() => (phase, Effect::EditorWrite(ch)),
            _ => (phase, Effect::None),
        },

        Phase::Exit => (phase, Effect::None),
    }
}

/// Phase after a gameplay step: death and win take over from movement.
pub fn settle(phase: Phase, session: &Session) -> Phase {
    if phase != Phase::Gameplay {
        return phase;
    }
    if session.dead {
        Phase::Death
    } else if session.won {
        Phase::Win
    } else {
        phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::Grid;
    use crate::sim::level::Level;

    fn press(phase: Phase, c: char) -> (Phase, Effect) {
        transition(phase, Key::Char(c), &Keymap::default(), false)
    }

    #[test]
    fn main_menu_routes_digits() {
        assert_eq!(press(Phase::MainMenu, '1'), (Phase::PlayMenu, Effect::Redraw));
        assert_eq!(press(Phase::MainMenu, '2'), (Phase::Editor, Effect::OpenEditor));
        assert_eq!(press(Phase::MainMenu, '3'), (Phase::Exit, Effect::Exit));
        assert_eq!(press(Phase::MainMenu, 'x'), (Phase::MainMenu, Effect::None));
    }

    #[test]
    fn play_menu_routes_digits_and_back() {
        assert_eq!(press(Phase::PlayMenu, '1'), (Phase::Gameplay, Effect::StartGameplay));
        assert_eq!(press(Phase::PlayMenu, '2'), (Phase::PlayMenu, Effect::PromptLoadLevel));
        assert_eq!(press(Phase::PlayMenu, '3'), (Phase::MainMenu, Effect::Redraw));
        assert_eq!(press(Phase::PlayMenu, 'B'), (Phase::MainMenu, Effect::Redraw));
    }

    #[test]
    fn gameplay_maps_movement_case_insensitively() {
        assert_eq!(press(Phase::Gameplay, 'w'), (Phase::Gameplay, Effect::Step(MoveDir::Up)));
        assert_eq!(press(Phase::Gameplay, 'D'), (Phase::Gameplay, Effect::Step(MoveDir::Right)));
        assert_eq!(press(Phase::Gameplay, '\\'), (Phase::Gameplay, Effect::ToggleNoclip));
        assert_eq!(press(Phase::Gameplay, 'q'), (Phase::MainMenu, Effect::LeaveGameplay));
        assert_eq!(press(Phase::Gameplay, 'z'), (Phase::Gameplay, Effect::None));
    }

    #[test]
    fn death_accepts_only_respawn_and_quit() {
        assert_eq!(press(Phase::Death, 'r'), (Phase::Gameplay, Effect::Respawn));
        assert_eq!(press(Phase::Death, 'q'), (Phase::MainMenu, Effect::LeaveGameplay));
        assert_eq!(press(Phase::Death, 'w'), (Phase::Death, Effect::None));
        assert_eq!(press(Phase::Death, 'n'), (Phase::Death, Effect::None));
    }

    #[test]
    fn win_advances_only_when_next_is_named() {
        let km = Keymap::default();
        assert_eq!(
            transition(Phase::Win, Key::Char('n'), &km, false),
            (Phase::Win, Effect::None)
        );
        assert_eq!(
            transition(Phase::Win, Key::Char('n'), &km, true),
            (Phase::Gameplay, Effect::AdvanceLevel)
        );
    }

    #[test]
    fn editor_writes_unbound_printables() {
        assert_eq!(press(Phase::Editor, '#'), (Phase::Editor, Effect::EditorWrite('#')));
        assert_eq!(press(Phase::Editor, 'r'), (Phase::Editor, Effect::EditorWrite('r')));
        assert_eq!(press(Phase::Editor, 'e'), (Phase::Editor, Effect::EditorToggleLayer));
        assert_eq!(press(Phase::Editor, '1'), (Phase::Editor, Effect::EditorSave));
        assert_eq!(press(Phase::Editor, '2'), (Phase::Editor, Effect::EditorExport));
        assert_eq!(press(Phase::Editor, 'f'), (Phase::Editor, Effect::EditorSetNext));
        assert_eq!(press(Phase::Editor, 'S'), (Phase::Editor, Effect::EditorCursor(MoveDir::Down)));
        assert_eq!(press(Phase::Editor, 'q'), (Phase::MainMenu, Effect::LeaveEditor));
        assert_eq!(press(Phase::Editor, '\n'), (Phase::Editor, Effect::None));
    }

    #[test]
    fn interrupt_exits_from_anywhere() {
        for phase in [Phase::MainMenu, Phase::Gameplay, Phase::Editor, Phase::Win] {
            assert_eq!(
                transition(phase, Key::Interrupt, &Keymap::default(), false),
                (Phase::Exit, Effect::Exit)
            );
        }
    }

    #[test]
    fn settle_enters_terminal_states() {
        let map = Grid::from_rows(&["@_P"]);
        let level = Level { persist: Grid::new(3, 1), map, next: String::new() };
        let mut s = Session::new(level, 4);
        s.start().unwrap();
        assert_eq!(settle(Phase::Gameplay, &s), Phase::Gameplay);
        s.step(MoveDir::Right);
        assert_eq!(settle(Phase::Gameplay, &s), Phase::Death);
        s.respawn().unwrap();
        s.toggle_noclip();
        s.step(MoveDir::Right);
        s.toggle_noclip();
        s.step(MoveDir::Right);
        assert_eq!(settle(Phase::Gameplay, &s), Phase::Win);
    }

    #[test]
    fn status_agrees_with_transition() {
        let km = Keymap::default();
        for (phase, key, has_next) in [
            (Phase::Gameplay, 'q', false),
            (Phase::Death, 'q', false),
            (Phase::Win, 'n', true),
            (Phase::Editor, 'q', false),
        ] {
            let (next, effect) = transition(phase, Key::Char(key), &km, has_next);
            let status = effect.status().unwrap();
            assert_eq!(status.next_phase(), next, "{:?}", effect);
        }
        assert_eq!(Status::LevelNotFound.next_phase(), Phase::PlayMenu);
        assert_eq!(Status::LevelMalformed.next_phase(), Phase::PlayMenu);
    }

    #[test]
    fn level_errors_map_to_status() {
        let err = LevelError::Malformed("short".into());
        assert_eq!(Status::from(&err), Status::LevelMalformed);
        assert_eq!(Effect::LeaveEditor.status(), Some(Status::EditorQuit));
        assert_eq!(Status::LevelNotFound.message(), Some("Map not found."));
    }
}
