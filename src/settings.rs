use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

use crate::timer::{DEFAULT_BREAK_MINUTES, DEFAULT_WORK_MINUTES};

/// Persisted user settings. The `workDuration`/`breakDuration` keys are the
/// well-known names; a missing key deserializes to the built-in default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerDurations {
    #[serde(default = "default_work", rename = "workDuration")]
    pub work_minutes: u32,
    #[serde(default = "default_break", rename = "breakDuration")]
    pub break_minutes: u32,
}

fn default_work() -> u32 {
    DEFAULT_WORK_MINUTES
}

fn default_break() -> u32 {
    DEFAULT_BREAK_MINUTES
}

impl Default for TimerDurations {
    fn default() -> Self {
        Self {
            work_minutes: DEFAULT_WORK_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
        }
    }
}

/// JSON-file settings store. Reads happen once at construction; writes go
/// through [`SettingsStore::update`] and rewrite the whole file. The file
/// holds nothing but the two duration integers.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<TimerDurations>,
}

impl SettingsStore {
    /// Opens the store. A missing file means defaults; an unreadable or
    /// unparseable file also means defaults, with a warning, so a broken
    /// settings file can never keep the timer from coming up.
    pub fn new(path: PathBuf) -> Self {
        let data = if path.exists() {
            match fs::read_to_string(&path) {
                Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                    warn!(
                        "Settings file {} is unparseable ({err}), falling back to defaults",
                        path.display()
                    );
                    TimerDurations::default()
                }),
                Err(err) => {
                    warn!(
                        "Failed to read settings from {} ({err}), falling back to defaults",
                        path.display()
                    );
                    TimerDurations::default()
                }
            }
        } else {
            TimerDurations::default()
        };

        Self {
            path,
            data: RwLock::new(data),
        }
    }

    pub fn durations(&self) -> TimerDurations {
        *self.data.read().unwrap()
    }

    pub fn update(&self, work_minutes: u32, break_minutes: u32) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        *guard = TimerDurations {
            work_minutes,
            break_minutes,
        };
        self.persist(&guard)
    }

    fn persist(&self, data: &TimerDurations) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
