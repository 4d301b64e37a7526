/// Background settings passed in from the extension's loader script
use log::Level;
use serde::{Deserialize, Serialize};

pub const DEFAULT_STASH_KEY: &str = "stashes";
pub const DEFAULT_STASH_PREFIX: &str = "Stash";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Storage key holding the stash collection
    pub stash_storage_key: String,
    /// Stash names are "<prefix> N"
    pub stash_name_prefix: String,
    /// Any `log::Level` name, case-insensitive; unknown names mean info
    pub log_level: String,
}

impl Settings {
    pub fn level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::Info)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            stash_storage_key: DEFAULT_STASH_KEY.to_string(),
            stash_name_prefix: DEFAULT_STASH_PREFIX.to_string(),
            log_level: "info".to_string(),
        }
    }
}
