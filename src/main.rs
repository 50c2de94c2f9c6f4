/// Entry point and game loop.
///
/// The loop is turn-based: draw, block for one key, run the state
/// machine, carry out its effect. Nothing happens between keys.

mod config;
mod domain;
mod sim;
mod ui;

use std::io;
use std::sync::Mutex;

use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use sim::editor::Editor;
use sim::level::{embedded_default, level_path, load_file, save_file, Level};
use sim::machine::{settle, transition, Effect, Phase, Status};
use sim::session::Session;
use ui::input::{read_key, Keymap, LineEdit, LineStatus};
use ui::renderer::{Renderer, Screen};

const LOG_FILTER_ENV: &str = "PUSHBOX_LOG";
const LOG_FILE_ENV: &str = "PUSHBOX_LOG_FILE";
const DEFAULT_LOG_FILE: &str = "pushbox.log";

fn main() {
    init_tracing();
    info!("=== pushbox startup ===");

    let config = GameConfig::load();
    let initial = initial_level(&config);
    let mut session = Session::new(initial, config.max_boxes);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        std::process::exit(1);
    }

    let result = game_loop(&mut session, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        error!(error = %e, "fatal");
        eprintln!("pushbox: {e}");
        std::process::exit(1);
    }
    info!("clean exit");
}

/// The terminal is in raw mode while the game runs, so logs only go to a
/// file, and only when `PUSHBOX_LOG` holds a filter directive.
fn init_tracing() {
    let Ok(directive) = std::env::var(LOG_FILTER_ENV) else {
        return;
    };
    let path = std::env::var(LOG_FILE_ENV).unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string());
    let file = match std::fs::File::create(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Could not open log file {path}: {e}");
            return;
        }
    };
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

fn initial_level(config: &GameConfig) -> Level {
    let Some(name) = &config.start_level else {
        return embedded_default();
    };
    match load_file(&level_path(&config.levels_dir, name)) {
        Ok(level) => level,
        Err(e) => {
            warn!(level = %name, error = %e, "start level unusable, using built-in level");
            embedded_default()
        }
    }
}

fn game_loop(
    session: &mut Session,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let keys = &config.keymap;
    let mut phase = Phase::MainMenu;
    let mut editor = Editor::open(session.template());
    let mut message = String::new();

    while phase != Phase::Exit {
        draw(renderer, phase, session, &editor, &message, keys)?;

        let key = read_key()?;
        let has_next = !session.next_level().is_empty();
        let (next, effect) = transition(phase, key, keys, has_next);
        if effect == Effect::None {
            continue;
        }
        if next != phase {
            debug!(from = ?phase, to = ?next, ?effect, "phase change");
        }
        message.clear();
        let next = match effect.status() {
            Some(status) => report(status, &mut message),
            None => next,
        };
        phase = apply(effect, next, session, &mut editor, renderer, config, &mut message)?;
    }

    Ok(())
}

/// Carry out one effect and return the phase the loop continues in.
fn apply(
    effect: Effect,
    phase: Phase,
    session: &mut Session,
    editor: &mut Editor,
    renderer: &mut Renderer,
    config: &GameConfig,
    message: &mut String,
) -> Result<Phase, Box<dyn std::error::Error>> {
    match effect {
        Effect::None | Effect::Redraw | Effect::Exit | Effect::LeaveGameplay => {}

        Effect::StartGameplay => session.start()?,

        Effect::PromptLoadLevel => {
            let Some(name) = prompt(renderer, "Map name: ")? else {
                return Ok(phase);
            };
            return enter_level(&name, session, config, message);
        }

        Effect::Step(dir) => {
            session.step(dir);
            return Ok(settle(phase, session));
        }

        Effect::Respawn => session.respawn()?,

        Effect::ToggleNoclip => session.toggle_noclip(),

        Effect::AdvanceLevel => {
            let name = session.next_level().to_string();
            return enter_level(&name, session, config, message);
        }

        Effect::OpenEditor => {
            *editor = Editor::open(session.template());
            info!("editor opened");
        }
        Effect::EditorCursor(dir) => editor.move_cursor(dir),
        Effect::EditorToggleLayer => editor.toggle_layer(),
        Effect::EditorWrite(ch) => editor.write(ch),

        Effect::EditorSave => {
            session.install_level(editor.level().clone());
            *message = "Map saved.".to_string();
        }

        Effect::EditorExport => {
            session.install_level(editor.level().clone());
            if let Some(name) = prompt(renderer, "Export as: ")? {
                *message = export(editor.level(), &name, config);
            }
        }

        Effect::EditorSetNext => {
            if let Some(name) = prompt(renderer, "Next map: ")? {
                editor.set_next(name);
            }
        }

        Effect::LeaveEditor => info!("editor closed"),
    }
    Ok(phase)
}

/// Load a named level and start playing it. File errors leave the
/// session untouched and land on the play menu with a message.
fn enter_level(
    name: &str,
    session: &mut Session,
    config: &GameConfig,
    message: &mut String,
) -> Result<Phase, Box<dyn std::error::Error>> {
    match session.load_level(&level_path(&config.levels_dir, name)) {
        Ok(()) => {
            session.start()?;
            Ok(Phase::Gameplay)
        }
        Err(e) => {
            warn!(level = %name, error = %e, "level load failed");
            Ok(report(Status::from(&e), message))
        }
    }
}

/// Show the status message, if any, and return the phase it leads to.
fn report(status: Status, message: &mut String) -> Phase {
    debug!(?status, "status");
    if let Some(text) = status.message() {
        *message = text.to_string();
    }
    status.next_phase()
}

fn export(level: &Level, name: &str, config: &GameConfig) -> String {
    if let Err(e) = std::fs::create_dir_all(&config.levels_dir) {
        warn!(dir = %config.levels_dir.display(), error = %e, "could not create levels dir");
    }
    let path = level_path(&config.levels_dir, name);
    match save_file(&path, level) {
        Ok(()) => format!("Map exported to {}.", path.display()),
        Err(e) => {
            warn!(error = %e, "export failed");
            "Export failed.".to_string()
        }
    }
}

/// Read a single word under the current screen. `None` when cancelled.
fn prompt(renderer: &mut Renderer, label: &str) -> io::Result<Option<String>> {
    let mut line = LineEdit::default();
    loop {
        renderer.render_prompt(label, &line.text)?;
        match line.feed(read_key()?) {
            LineStatus::Editing => {}
            LineStatus::Done(text) => {
                renderer.end_prompt()?;
                return Ok(Some(text));
            }
            LineStatus::Cancelled => {
                renderer.end_prompt()?;
                return Ok(None);
            }
        }
    }
}

fn draw(
    renderer: &mut Renderer,
    phase: Phase,
    session: &mut Session,
    editor: &Editor,
    message: &str,
    keys: &Keymap,
) -> io::Result<()> {
    let screen = match phase {
        Phase::MainMenu | Phase::Exit => Screen::MainMenu,
        Phase::PlayMenu => Screen::PlayMenu,
        Phase::Gameplay => Screen::Gameplay(session),
        Phase::Editor => Screen::Editor(editor),
        Phase::Death => Screen::Death,
        Phase::Win => Screen::Win { next: session.next_level() },
    };
    renderer.render(screen, message, keys)
}
