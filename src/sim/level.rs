/// Level codec and the embedded default level.
///
/// ## File format (`.map`)
///   ```
///   map:
///   <11 rows of 32 tiles>
///   END
///   persist:
///   <11 rows of 32 tiles>
///   END
///   next:<level name, may be empty>END
///   ```
///
/// Each section is closed by `END` followed by a newline. Sections are
/// matched by label; unknown labels are skipped. The `map:` section must
/// be exactly `ROWS * (COLS + 1)` characters long.
///
/// ## Tile legend:
///   '.' = Floor            '#' = Wall (blocks player and box)
///   '=' = Persistent wall  '_' = Consuming hazard
///   ' ' = Silent hazard    'P' = Goal
///   '@' = Player spawn     '%' = Box spawn

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::grid::{Grid, COLS, ROWS};
use crate::domain::tile::Tile;

const SENTINEL: &str = "END\n";
const MAP_LABEL: &str = "map:\n";
const PERSIST_LABEL: &str = "persist:\n";
const NEXT_LABEL: &str = "next:";

pub const EXTENSION: &str = "map";

/// A level template: what the codec reads and writes, what the editor edits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Level {
    pub map: Grid,
    pub persist: Grid,
    pub next: String,
}

impl Level {
    pub fn empty() -> Self {
        Level {
            map: Grid::standard(),
            persist: Grid::standard(),
            next: String::new(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("level not found: {}", path.display())]
    NotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("level is malformed or corrupted: {0}")]
    Malformed(String),

    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// `<dir>/<name>.map`
pub fn level_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.{}", name, EXTENSION))
}

/// Read and parse a level file. Nothing outside the returned value is touched.
pub fn load_file(path: &Path) -> Result<Level, LevelError> {
    let mut file = std::fs::File::open(path).map_err(|source| LevelError::NotFound {
        path: path.to_path_buf(),
        source,
    })?;
    let mut text = String::new();
    file.read_to_string(&mut text).map_err(|source| LevelError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let level = parse(&text)?;
    info!(path = %path.display(), next = %level.next, "level loaded");
    Ok(level)
}

pub fn save_file(path: &Path, level: &Level) -> Result<(), LevelError> {
    std::fs::write(path, serialize(level)).map_err(|source| LevelError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "level exported");
    Ok(())
}

/// Parse level text.
pub fn parse(text: &str) -> Result<Level, LevelError> {
    if !text.contains(SENTINEL) || !text.contains(MAP_LABEL) {
        return Err(LevelError::Malformed(
            "missing END sentinel or map: label".to_string(),
        ));
    }

    let first = text.split(SENTINEL).next().unwrap_or_default();
    let expected = ROWS * (COLS + 1);
    let found = first.chars().count().saturating_sub(MAP_LABEL.len());
    if first.chars().count() < MAP_LABEL.len() || found != expected {
        return Err(LevelError::Malformed(format!(
            "map section has {} characters, expected {}",
            found, expected
        )));
    }

    let mut level = Level::empty();
    let sections: Vec<&str> = text.split(SENTINEL).collect();
    let last = sections.len() - 1;
    for (i, section) in sections.into_iter().enumerate() {
        if let Some(body) = section.strip_prefix(MAP_LABEL) {
            fill_rows(&mut level.map, body);
        } else if let Some(body) = section.strip_prefix(PERSIST_LABEL) {
            fill_rows(&mut level.persist, body);
        } else if let Some(body) = section.strip_prefix(NEXT_LABEL) {
            // Only an unterminated last section may end in a bare END.
            let name = if i == last { body.strip_suffix("END").unwrap_or(body) } else { body };
            level.next = name.to_string();
        } else if !section.is_empty() {
            debug!(section = %section.lines().next().unwrap_or_default(), "skipping unknown section");
        }
    }

    Ok(level)
}

/// Exact inverse of `parse`.
pub fn serialize(level: &Level) -> String {
    let mut out = String::with_capacity(2 * ROWS * (COLS + 1) + 64);
    out.push_str(MAP_LABEL);
    out.push_str(&level.map.to_text());
    out.push_str(SENTINEL);
    out.push_str(PERSIST_LABEL);
    out.push_str(&level.persist.to_text());
    out.push_str(SENTINEL);
    out.push_str(NEXT_LABEL);
    out.push_str(&level.next);
    out.push_str(SENTINEL);
    out
}

fn fill_rows(grid: &mut Grid, body: &str) {
    for (y, line) in body.split('\n').take(grid.height()).enumerate() {
        for (x, ch) in line.chars().take(grid.width()).enumerate() {
            grid.set(x, y, Tile::from_char(ch));
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Embedded default level
// ══════════════════════════════════════════════════════════════

pub fn embedded_default() -> Level {
    Level {
        map: Grid::from_rows(&[
            "..................#.............",
            ".................._.............",
            ".................._.......%.....",
            ".................._..........P..",
            "..................#.............",
            ".......############.............",
            "..................#_____________",
            "..................#.............",
            "..................#..@.....%....",
            "..................#.............",
            "..................#.............",
        ]),
        persist: Grid::from_rows(&[
            ".................=.=============",
            ".................=.............=",
            ".................=.............=",
            ".................=.............=",
            ".................=.............=",
            "...................=============",
            "................................",
            "...............................=",
            "...............................=",
            "...............................=",
            "...................=============",
        ]),
        next: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pushbox-{}-{}.map", tag, std::process::id()))
    }

    #[test]
    fn embedded_level_is_full_size() {
        let level = embedded_default();
        assert_eq!(level.map.width(), COLS);
        assert_eq!(level.map.height(), ROWS);
        assert_eq!(level.persist.width(), COLS);
        assert_eq!(level.persist.height(), ROWS);
    }

    #[test]
    fn serialize_matches_file_layout() {
        let mut level = Level::empty();
        level.next = "two".to_string();
        let text = serialize(&level);
        let row = format!("{}\n", ".".repeat(COLS));
        let grid = row.repeat(ROWS);
        assert_eq!(
            text,
            format!("map:\n{grid}END\npersist:\n{grid}END\nnext:twoEND\n")
        );
    }

    #[test]
    fn parse_inverts_serialize() {
        let mut level = embedded_default();
        level.persist.set(0, 0, Tile::HazardSilent);
        level.map.set(3, 3, Tile::Other('k'));
        level.next = "level two".to_string();
        let back = parse(&serialize(&level)).unwrap();
        assert_eq!(back, level);
    }

    #[test]
    fn file_round_trip() {
        let path = temp_path("roundtrip");
        let mut level = embedded_default();
        level.next = "after".to_string();
        save_file(&path, &level).unwrap();
        let back = load_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(back.map, level.map);
        assert_eq!(back.persist, level.persist);
        assert_eq!(back.next, "after");
    }

    #[test]
    fn missing_file_is_not_found() {
        let path = temp_path("does-not-exist");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(load_file(&path), Err(LevelError::NotFound { .. })));
    }

    #[test]
    fn short_map_section_is_malformed() {
        let text = serialize(&embedded_default());
        // Drop one tile from the first row.
        let broken = text.replacen("..................#.............\n", "..................#............\n", 1);
        assert_eq!(broken.len() + 1, text.len());
        assert!(matches!(parse(&broken), Err(LevelError::Malformed(_))));
    }

    #[test]
    fn missing_sentinel_is_malformed() {
        assert!(matches!(parse("map:\n....\n"), Err(LevelError::Malformed(_))));
        assert!(matches!(parse("persist:\nEND\n"), Err(LevelError::Malformed(_))));
    }

    #[test]
    fn unknown_and_missing_sections_are_skipped() {
        let level = embedded_default();
        let text = format!(
            "map:\n{}END\nnotes:\nhello\nEND\n",
            level.map.to_text()
        );
        let back = parse(&text).unwrap();
        assert_eq!(back.map, level.map);
        assert_eq!(back.persist, Grid::standard());
        assert_eq!(back.next, "");
    }

    #[test]
    fn next_without_trailing_newline() {
        let text = format!("map:\n{}END\nnext:finaleEND", Grid::standard().to_text());
        assert_eq!(parse(&text).unwrap().next, "finale");
    }

    #[test]
    fn next_name_ending_in_end_survives() {
        let mut level = Level::empty();
        level.next = "WEEKEND".to_string();
        assert_eq!(parse(&serialize(&level)).unwrap().next, "WEEKEND");

        let text = format!("map:\n{}END\nnext:WEEKENDEND", Grid::standard().to_text());
        assert_eq!(parse(&text).unwrap().next, "WEEKEND");
    }

    #[test]
    fn level_path_appends_extension() {
        assert_eq!(level_path(Path::new("lv"), "one"), PathBuf::from("lv/one.map"));
    }
}
