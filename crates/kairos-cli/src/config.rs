//! `kairos.toml` loading.
//!
//! The configuration is read once in `main` and handed to the file-backed
//! collaborators by value. Every key is optional.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use kairos_engine::LabelTemplate;
use serde::Deserialize;

/// Name of the config file picked up from the working directory when
/// `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "kairos.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// IANA zone used for naive timestamps, all-day events and created events.
    pub time_zone: String,
    /// Calendar that created events are addressed to.
    pub calendar_id: String,
    /// Calendar export holding existing events.
    pub calendar_file: PathBuf,
    /// To-do export holding work items.
    pub todo_file: PathBuf,
    /// Where created events are appended, one JSON object per line.
    pub events_file: PathBuf,
    pub labels: LabelTemplate,
    /// Course id → display name.
    pub courses: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_zone: "America/Chicago".to_string(),
            calendar_id: "primary".to_string(),
            calendar_file: PathBuf::from("calendar.json"),
            todo_file: PathBuf::from("todo.json"),
            events_file: PathBuf::from("events.jsonl"),
            labels: LabelTemplate::default(),
            courses: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Parse a config file. Relative paths inside it are resolved against the
    /// file's own directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config = toml::from_str(&text)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        config.zone()?;
        Ok(config)
    }

    /// Load `path` if given, else `kairos.toml` from the working directory if
    /// present, else the defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn zone(&self) -> Result<Tz> {
        kairos_engine::zone::parse_zone(&self.time_zone)
            .with_context(|| format!("Invalid time_zone in config: {}", self.time_zone))
    }

    fn resolve_paths(&mut self, dir: &Path) {
        for path in [
            &mut self.calendar_file,
            &mut self.todo_file,
            &mut self.events_file,
        ] {
            if path.is_relative() {
                *path = dir.join(&*path);
            }
        }
    }
}
