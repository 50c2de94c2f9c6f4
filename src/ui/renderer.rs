/// Presentation layer: buffered terminal renderer.
///
/// How it works:
///   1. Gameplay frames project the box registry onto the transient grid
///      (the next `recompute_frame` wipes the glyphs again)
///   2. Each tile maps to a glyph + colour through a fixed table
///   3. All commands are batched with `queue!`, flushed once at the end
///   4. A gameplay frame identical to the last one drawn is skipped
///
/// Switching screens clears the terminal once; within a screen, rows are
/// overwritten in place.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::boxes::BoxRegistry;
use crate::domain::grid::{frames_equal, Grid};
use crate::domain::tile::Tile;
use crate::sim::editor::Editor;
use crate::sim::session::Session;
use crate::ui::input::{Command, Keymap};

// ── Tile → glyph ──

/// Display glyph and colour for a tile. `None` = terminal default.
pub fn glyph(tile: Tile) -> (char, Option<Color>) {
    match tile {
        Tile::HazardConsuming => ('_', Some(Color::DarkRed)),
        Tile::Goal            => ('P', Some(Color::AnsiValue(93))),
        Tile::Player          => ('@', Some(Color::Green)),
        Tile::Box             => ('%', Some(Color::Yellow)),
        Tile::PersistentWall  => ('=', Some(Color::DarkCyan)),
        other                 => (other.to_char(), None),
    }
}

/// Write a box glyph into the grid for every in-bounds box.
/// Lasts until the next `recompute_frame`.
pub fn project_boxes(grid: &mut Grid, boxes: &BoxRegistry) {
    for b in boxes.iter() {
        grid.set(b.pos.x, b.pos.y, Tile::Box);
    }
}

/// Queue a grid at `top`, one terminal row per grid row.
/// Colour changes are only emitted when the colour actually changes.
pub fn queue_grid<W: Write>(out: &mut W, grid: &Grid, top: u16, colored: bool) -> io::Result<()> {
    for (y, row) in grid.rows().enumerate() {
        queue!(out, MoveTo(0, top + y as u16))?;
        let mut current: Option<Color> = None;
        for tile in row {
            let (ch, color) = if colored { glyph(*tile) } else { (tile.to_char(), None) };
            if color != current {
                match color {
                    Some(c) => queue!(out, SetForegroundColor(c))?,
                    None => queue!(out, ResetColor)?,
                }
                current = color;
            }
            queue!(out, Print(ch))?;
        }
        if current.is_some() {
            queue!(out, ResetColor)?;
        }
    }
    Ok(())
}

// ── Screens ──

/// What to draw.
pub enum Screen<'a> {
    MainMenu,
    PlayMenu,
    Gameplay(&'a mut Session),
    Editor(&'a Editor),
    Death,
    Win { next: &'a str },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ScreenKind {
    MainMenu,
    PlayMenu,
    Gameplay,
    Editor,
    Death,
    Win,
}

impl Screen<'_> {
    fn kind(&self) -> ScreenKind {
        match self {
            Screen::MainMenu => ScreenKind::MainMenu,
            Screen::PlayMenu => ScreenKind::PlayMenu,
            Screen::Gameplay(_) => ScreenKind::Gameplay,
            Screen::Editor(_) => ScreenKind::Editor,
            Screen::Death => ScreenKind::Death,
            Screen::Win { .. } => ScreenKind::Win,
        }
    }
}

/// Vertical layout
const TITLE_ROW: u16 = 0;
const MAP_ROW: u16 = 2;

fn help_row(grid_h: usize) -> u16 {
    MAP_ROW + grid_h as u16 + 1
}

fn message_row(grid_h: usize) -> u16 {
    help_row(grid_h) + 3
}

const MENU_MESSAGE_ROW: u16 = 6;
const BANNER_ROW: u16 = 3;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    last_screen: Option<ScreenKind>,
    last_frame: Option<Grid>,
    last_message: String,
    last_noclip: bool,
    prompt_row: u16,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            last_screen: None,
            last_frame: None,
            last_message: String::new(),
            last_noclip: false,
            prompt_row: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            Clear(ClearType::All)
        )
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, screen: Screen<'_>, message: &str, keys: &Keymap) -> io::Result<()> {
        let kind = screen.kind();
        let screen_changed = self.last_screen != Some(kind);
        if screen_changed {
            queue!(self.writer, ResetColor, Clear(ClearType::All))?;
            self.last_screen = Some(kind);
            self.last_frame = None;
        }

        match screen {
            Screen::MainMenu => self.compose_main_menu(message)?,
            Screen::PlayMenu => self.compose_play_menu(message)?,
            Screen::Gameplay(session) => {
                let noclip = !session.collision;
                let (frame, boxes) = session.frame_parts();
                project_boxes(frame, boxes);
                let frame: &Grid = frame;
                let unchanged = self.last_frame.as_ref().map_or(false, |f| frames_equal(f, frame))
                    && self.last_message == message
                    && self.last_noclip == noclip;
                if unchanged {
                    return Ok(());
                }
                self.compose_gameplay(frame, noclip, message, keys)?;
                self.last_frame = Some(frame.clone());
                self.last_noclip = noclip;
            }
            Screen::Editor(editor) => self.compose_editor(editor, message, keys)?,
            Screen::Death => self.compose_death(keys)?,
            Screen::Win { next } => self.compose_win(next, keys)?,
        }

        self.last_message = message.to_string();
        self.writer.flush()
    }

    /// Draw the name prompt under the current screen.
    pub fn render_prompt(&mut self, label: &str, text: &str) -> io::Result<()> {
        queue!(
            self.writer,
            MoveTo(0, self.prompt_row),
            Clear(ClearType::CurrentLine),
            Print(label),
            Print(text),
            cursor::Show
        )?;
        self.writer.flush()
    }

    pub fn end_prompt(&mut self) -> io::Result<()> {
        queue!(
            self.writer,
            MoveTo(0, self.prompt_row),
            Clear(ClearType::CurrentLine),
            cursor::Hide
        )?;
        self.writer.flush()
    }

    // ── Compose ──

    fn put_line(&mut self, row: u16, text: &str, color: Option<Color>) -> io::Result<()> {
        queue!(self.writer, MoveTo(0, row), Clear(ClearType::CurrentLine))?;
        match color {
            Some(c) => queue!(self.writer, SetForegroundColor(c), Print(text), ResetColor),
            None => queue!(self.writer, Print(text)),
        }
    }

    fn compose_main_menu(&mut self, message: &str) -> io::Result<()> {
        self.put_line(0, "=========Main Menu=========", None)?;
        self.put_line(1, "       1) Play", None)?;
        self.put_line(2, "       2) Editor", None)?;
        self.put_line(3, "       3) Quit", None)?;
        self.put_line(MENU_MESSAGE_ROW, message, Some(Color::DarkYellow))?;
        self.prompt_row = MENU_MESSAGE_ROW + 2;
        Ok(())
    }

    fn compose_play_menu(&mut self, message: &str) -> io::Result<()> {
        self.put_line(0, "=========Play Menu=========", None)?;
        self.put_line(1, "       1) Play Loaded Map", None)?;
        self.put_line(2, "       2) Load Map", None)?;
        self.put_line(3, "       3) Back", None)?;
        self.put_line(MENU_MESSAGE_ROW, message, Some(Color::DarkYellow))?;
        self.prompt_row = MENU_MESSAGE_ROW + 2;
        Ok(())
    }

    fn compose_gameplay(&mut self, frame: &Grid, noclip: bool, message: &str, keys: &Keymap) -> io::Result<()> {
        let mode = if noclip { "NOCLIP" } else { "" };
        self.put_line(TITLE_ROW, &format!(" pushbox  {}", mode), Some(Color::Grey))?;
        queue_grid(&mut self.writer, frame, MAP_ROW, true)?;

        let h = frame.height();
        let help = format!(
            "{}{}{}{} - Move    {} - Restart    {} - Quit to menu    {} - Noclip",
            keys.label(Command::MoveUp),
            keys.label(Command::MoveLeft),
            keys.label(Command::MoveDown),
            keys.label(Command::MoveRight),
            keys.label(Command::Respawn),
            keys.label(Command::Quit),
            keys.label(Command::ToggleNoclip),
        );
        self.put_line(help_row(h), &help, Some(Color::DarkGrey))?;
        self.put_line(message_row(h), message, Some(Color::DarkYellow))?;
        self.prompt_row = message_row(h) + 2;
        Ok(())
    }

    fn compose_editor(&mut self, editor: &Editor, message: &str, keys: &Keymap) -> io::Result<()> {
        let mut view = editor.active().clone();
        view.set(editor.cursor.x, editor.cursor.y, Tile::EditorCursor);

        self.put_line(TITLE_ROW, " pushbox editor", Some(Color::Grey))?;
        queue_grid(&mut self.writer, &view, MAP_ROW, false)?;

        let h = view.height();
        let line1 = format!(
            "{}{}{}{} - Move cursor    {} - Switch map mode    Current map: {}",
            keys.label(Command::MoveUp),
            keys.label(Command::MoveLeft),
            keys.label(Command::MoveDown),
            keys.label(Command::MoveRight),
            keys.label(Command::SwitchLayer),
            editor.layer.name(),
        );
        let line2 = format!(
            "{} - Quit editor    {} - Save    {} - Export map    {} - Set next map: {}.map",
            keys.label(Command::Quit),
            keys.label(Command::Save),
            keys.label(Command::Export),
            keys.label(Command::SetNextLevel),
            editor.level().next,
        );
        self.put_line(help_row(h), &line1, None)?;
        self.put_line(help_row(h) + 1, &line2, None)?;
        self.put_line(message_row(h), message, Some(Color::DarkYellow))?;
        self.prompt_row = message_row(h) + 2;
        Ok(())
    }

    fn compose_death(&mut self, keys: &Keymap) -> io::Result<()> {
        let art = [
            "╔══════════════════════════════╗",
            "║          YOU  DIED           ║",
            "╚══════════════════════════════╝",
        ];
        for (i, l) in art.iter().enumerate() {
            self.put_line(BANNER_ROW + i as u16, l, Some(Color::Red))?;
        }
        let options = format!(
            "-{} to respawn   -{} to quit to menu",
            keys.label(Command::Respawn).to_lowercase(),
            keys.label(Command::Quit).to_lowercase(),
        );
        self.put_line(BANNER_ROW + 4, &options, None)
    }

    fn compose_win(&mut self, next: &str, keys: &Keymap) -> io::Result<()> {
        let art = [
            "╔══════════════════════════════╗",
            "║           YOU  WIN           ║",
            "╚══════════════════════════════╝",
        ];
        for (i, l) in art.iter().enumerate() {
            self.put_line(BANNER_ROW + i as u16, l, Some(Color::AnsiValue(42)))?;
        }
        let mut options = format!("-{} to respawn   ", keys.label(Command::Respawn).to_lowercase());
        if !next.is_empty() {
            options.push_str(&format!(
                "-{} to go to the next map   ",
                keys.label(Command::NextLevel).to_lowercase()
            ));
        }
        options.push_str(&format!("-{} to quit to menu", keys.label(Command::Quit).to_lowercase()));
        self.put_line(BANNER_ROW + 4, &options, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::Command as _;

    fn ansi(color: Color) -> String {
        let mut s = String::new();
        SetForegroundColor(color).write_ansi(&mut s).unwrap();
        s
    }

    #[test]
    fn glyph_table_colours() {
        assert_eq!(glyph(Tile::HazardConsuming), ('_', Some(Color::DarkRed)));
        assert_eq!(glyph(Tile::Goal), ('P', Some(Color::AnsiValue(93))));
        assert_eq!(glyph(Tile::Player).1, Some(Color::Green));
        assert_eq!(glyph(Tile::Box).1, Some(Color::Yellow));
        assert_eq!(glyph(Tile::PersistentWall).1, Some(Color::DarkCyan));
        assert_eq!(glyph(Tile::HazardSilent), (' ', None));
        assert_eq!(glyph(Tile::Other('z')), ('z', None));
    }

    #[test]
    fn projection_writes_box_glyphs_in_bounds() {
        let mut grid = Grid::new(3, 1);
        let mut boxes = BoxRegistry::new(4);
        boxes.spawn(1, 0).unwrap();
        boxes.spawn(7, 7).unwrap();
        project_boxes(&mut grid, &boxes);
        assert_eq!(grid.get(1, 0), Some(Tile::Box));
        assert_eq!(grid.get(0, 0), Some(Tile::Floor));
    }

    #[test]
    fn projection_is_undone_by_recompute() {
        use crate::domain::grid::GridStore;
        let mut store = GridStore::new(3, 1);
        let mut boxes = BoxRegistry::new(4);
        boxes.spawn(0, 0).unwrap();
        project_boxes(&mut store.frame, &boxes);
        store.recompute_frame();
        assert_eq!(store.frame.get(0, 0), Some(Tile::Floor));
    }

    #[test]
    fn queued_grid_carries_glyphs_and_colours() {
        let grid = Grid::from_rows(&["._P", "=.."]);
        let mut out: Vec<u8> = Vec::new();
        queue_grid(&mut out, &grid, 0, true).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(&ansi(Color::DarkRed)));
        assert!(text.contains(&ansi(Color::AnsiValue(93))));
        assert!(text.contains(&ansi(Color::DarkCyan)));
        assert!(text.contains('_'));
        assert!(text.contains('P'));
    }

    #[test]
    fn plain_grid_has_no_colour() {
        let grid = Grid::from_rows(&["._P"]);
        let mut out: Vec<u8> = Vec::new();
        queue_grid(&mut out, &grid, 0, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains(&ansi(Color::DarkRed)));
        assert!(text.contains("._P"));
    }
}
