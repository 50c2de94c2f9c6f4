/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing or incomplete.
///
/// ```toml
/// [general]
/// levels_dir = "maps"
/// start_level = "intro"
///
/// [rules]
/// max_boxes = 15
///
/// [keys]
/// layout = "wasdrq\nn\\e12bf"
/// ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::domain::boxes::DEFAULT_MAX_BOXES;
use crate::ui::input::{Keymap, DEFAULT_LAYOUT};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub levels_dir: PathBuf,
    /// Level loaded at startup instead of the built-in one.
    pub start_level: Option<String>,
    pub max_boxes: usize,
    pub keymap: Keymap,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    keys: TomlKeys,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default)]
    start_level: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_max_boxes")]
    max_boxes: usize,
}

#[derive(Deserialize, Debug)]
struct TomlKeys {
    #[serde(default = "default_layout")]
    layout: String,
}

// ── Defaults ──

fn default_levels_dir() -> String { "maps".into() }
fn default_max_boxes() -> usize { DEFAULT_MAX_BOXES }
fn default_layout() -> String { DEFAULT_LAYOUT.into() }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            start_level: None,
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules { max_boxes: default_max_boxes() }
    }
}

impl Default for TomlKeys {
    fn default() -> Self {
        TomlKeys { layout: default_layout() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg, &search_dirs)
    }

    /// Parse a config document without touching the filesystem beyond
    /// resolving `levels_dir` against `base`.
    #[cfg(test)]
    fn from_toml_str(text: &str, base: &Path) -> Self {
        let toml_cfg = parse_toml(text).unwrap_or_default();
        Self::resolve(toml_cfg, &[base.to_path_buf()])
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if Path::new(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs
                .iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        let keymap = Keymap::parse(&toml_cfg.keys.layout).unwrap_or_else(|| {
            warn!(layout = ?toml_cfg.keys.layout, "key layout must be 14 characters, using default");
            Keymap::default()
        });

        let max_boxes = if toml_cfg.rules.max_boxes == 0 {
            warn!("max_boxes = 0 is not playable, using default");
            DEFAULT_MAX_BOXES
        } else {
            toml_cfg.rules.max_boxes
        };

        let start_level = toml_cfg.general.start_level.filter(|s| !s.trim().is_empty());

        GameConfig {
            levels_dir,
            start_level,
            max_boxes,
            keymap,
        }
    }
}

/// Candidate directories: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn parse_toml(text: &str) -> Result<TomlConfig, toml::de::Error> {
    toml::from_str::<TomlConfig>(text)
}

/// First readable config.toml wins.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match parse_toml(&text) {
                Ok(cfg) => {
                    info!(path = %path.display(), "config loaded");
                    return cfg;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "config.toml parse error, using defaults");
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config.toml");
            }
        }
    }
    TomlConfig::default()
}
