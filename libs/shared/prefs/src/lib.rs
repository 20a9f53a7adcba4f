use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default appointment slot length in minutes when no preference was saved.
pub const DEFAULT_SLOT_DURATION: u32 = 30;

/// Persisted marker that some view changed schedule data. Read by views that
/// poll for staleness instead of listening on the in-process bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTrigger {
    #[serde(rename = "doctorId")]
    pub doctor_id: Option<String>,
    pub timestamp: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferencesFile {
    slot_duration: Option<u32>,
    schedule_refresh_trigger: Option<RefreshTrigger>,
}

/// File-backed user preferences. Every accessor reads the file at call time
/// and every mutator rewrites it whole; concurrent writers are last-write-wins.
/// All IO is best-effort: a missing or corrupt file falls back to defaults.
pub struct Preferences {
    path: PathBuf,
}

impl Preferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn slot_duration(&self) -> u32 {
        self.load()
            .slot_duration
            .filter(|minutes| *minutes > 0)
            .unwrap_or(DEFAULT_SLOT_DURATION)
    }

    pub fn set_slot_duration(&self, minutes: u32) {
        let mut file = self.load();
        file.slot_duration = Some(minutes);
        self.store(file);
    }

    pub fn refresh_trigger(&self) -> Option<RefreshTrigger> {
        self.load().schedule_refresh_trigger
    }

    pub fn set_refresh_trigger(&self, trigger: RefreshTrigger) {
        let mut file = self.load();
        file.schedule_refresh_trigger = Some(trigger);
        self.store(file);
    }

    fn load(&self) -> PreferencesFile {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return PreferencesFile::default(),
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring unreadable preferences file {}: {}", self.path.display(), e);
            PreferencesFile::default()
        })
    }

    fn store(&self, file: PreferencesFile) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("Could not create preferences directory {}: {}", parent.display(), e);
                return;
            }
        }

        match serde_json::to_string_pretty(&file) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    warn!("Could not persist preferences to {}: {}", self.path.display(), e);
                }
            }
            Err(e) => warn!("Could not serialize preferences: {}", e),
        }
    }
}
