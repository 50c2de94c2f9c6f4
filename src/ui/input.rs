/// Keyboard input: the keybinding table and a blocking key reader.
///
/// One keypress is one tick. The reader blocks on crossterm's event
/// queue and ignores everything that is not a key press (release and
/// repeat events, resizes, mouse).
///
/// Bindings are positional: a 14-character layout string assigns one
/// key to each `Command` in declaration order.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::io;

/// Bindable actions, in layout order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    MoveUp,
    MoveLeft,
    MoveDown,
    MoveRight,
    Respawn,
    Quit,
    Confirm,
    NextLevel,
    ToggleNoclip,
    SwitchLayer,
    Save,
    Export,
    Back,
    SetNextLevel,
}

const LAYOUT_ORDER: [Command; 14] = [
    Command::MoveUp,
    Command::MoveLeft,
    Command::MoveDown,
    Command::MoveRight,
    Command::Respawn,
    Command::Quit,
    Command::Confirm,
    Command::NextLevel,
    Command::ToggleNoclip,
    Command::SwitchLayer,
    Command::Save,
    Command::Export,
    Command::Back,
    Command::SetNextLevel,
];

pub const DEFAULT_LAYOUT: &str = "wasdrq\nn\\e12bf";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keymap {
    keys: [char; 14],
}

impl Keymap {
    /// Parse a layout string. Must be exactly 14 characters; letters are
    /// stored lowercase.
    pub fn parse(layout: &str) -> Option<Keymap> {
        let chars: Vec<char> = layout.chars().map(fold_case).collect();
        let keys: [char; 14] = chars.try_into().ok()?;
        Some(Keymap { keys })
    }

    /// First command bound to `ch` (case-insensitive).
    pub fn lookup(&self, ch: char) -> Option<Command> {
        let ch = fold_case(ch);
        self.keys
            .iter()
            .position(|k| *k == ch)
            .map(|i| LAYOUT_ORDER[i])
    }

    /// The key bound to `cmd`, for help lines.
    pub fn key_for(&self, cmd: Command) -> char {
        let idx = LAYOUT_ORDER.iter().position(|c| *c == cmd).unwrap_or(0);
        self.keys[idx]
    }

    /// Printable label for a bound key.
    pub fn label(&self, cmd: Command) -> String {
        match self.key_for(cmd) {
            '\n' => "Enter".to_string(),
            ' ' => "Space".to_string(),
            c => c.to_ascii_uppercase().to_string(),
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Keymap::parse(DEFAULT_LAYOUT).unwrap_or(Keymap { keys: ['\0'; 14] })
    }
}

pub fn fold_case(ch: char) -> char {
    ch.to_lowercase().next().unwrap_or(ch)
}

/// A key press as the game sees it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Key {
    /// Printable character, case preserved. Enter arrives as '\n'.
    Char(char),
    Backspace,
    Escape,
    /// Ctrl+C: leave the program from any screen.
    Interrupt,
}

impl Key {
    fn from_event(key: KeyEvent) -> Option<Key> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Some(Key::Interrupt);
        }
        match key.code {
            KeyCode::Char(c) => Some(Key::Char(c)),
            KeyCode::Enter => Some(Key::Char('\n')),
            KeyCode::Tab => Some(Key::Char('\t')),
            KeyCode::Backspace => Some(Key::Backspace),
            KeyCode::Esc => Some(Key::Escape),
            _ => None,
        }
    }
}

/// Block until the next key press.
pub fn read_key() -> io::Result<Key> {
    loop {
        if let Event::Key(key) = event::read()? {
            if let Some(k) = Key::from_event(key) {
                return Ok(k);
            }
        }
    }
}

/// Line editing state for the name prompt.
///
/// Whitespace is not accepted: level names are single words.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LineEdit {
    pub text: String,
}

/// Outcome of feeding one key to a `LineEdit`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineStatus {
    Editing,
    Done(String),
    Cancelled,
}

impl LineEdit {
    pub fn feed(&mut self, key: Key) -> LineStatus {
        match key {
            Key::Char('\n') => {
                if self.text.is_empty() {
                    LineStatus::Cancelled
                } else {
                    LineStatus::Done(std::mem::take(&mut self.text))
                }
            }
            Key::Char(c) if !c.is_whitespace() && !c.is_control() => {
                self.text.push(c);
                LineStatus::Editing
            }
            Key::Backspace => {
                self.text.pop();
                LineStatus::Editing
            }
            Key::Escape | Key::Interrupt => LineStatus::Cancelled,
            Key::Char(_) => LineStatus::Editing,
        }
    }
}
