//! Configuration for parsing, exclusions and write-back

use crate::roster::{ExclusionSource, ParseMode, model::normalize_name};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "rostercraft.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default)]
    pub parse: ParseConfig,
    #[serde(default)]
    pub exclusion: ExclusionConfig,
    #[serde(default)]
    pub write_back: WriteBackConfig,
}

impl RosterConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: RosterConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the given file, or the default file when present, or defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the write path cannot work with
    pub fn validate(&self) -> Result<()> {
        let wb = &self.write_back;
        if wb.stale_lock_secs == 0 {
            anyhow::bail!("Configuration error: write_back.stale_lock_secs must be positive");
        }
        if wb.max_backups == 0 {
            anyhow::bail!("Configuration error: write_back.max_backups must be positive");
        }

        let mut components = Path::new(&wb.backup_dir).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => {}
            _ => anyhow::bail!(
                "Configuration error: write_back.backup_dir '{}' must be a single directory name",
                wb.backup_dir.display()
            ),
        }

        Ok(())
    }

    /// Parse mode selected by the configuration
    pub fn parse_mode(&self) -> ParseMode {
        if self.parse.display_all {
            ParseMode::DisplayAll
        } else {
            ParseMode::Export
        }
    }
}

impl ExclusionSource for RosterConfig {
    fn excluded_names(&self) -> Result<HashSet<String>> {
        Ok(self
            .exclusion
            .names
            .iter()
            .map(|name| normalize_name(name))
            .filter(|name| !name.is_empty())
            .collect())
    }
}

/// Parse settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Keep silent codes and excluded persons
    #[serde(default)]
    pub display_all: bool,
}

/// Names left out of exports, in addition to the built-in list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExclusionConfig {
    #[serde(default)]
    pub names: Vec<String>,
}

/// Write-back settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteBackConfig {
    /// Age after which a foreign sentinel counts as abandoned
    #[serde(default = "default_stale_lock_secs")]
    pub stale_lock_secs: u64,
    /// Backups kept per roster
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
    /// Backup directory next to the roster
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
}

impl WriteBackConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_lock_secs)
    }
}

impl Default for WriteBackConfig {
    fn default() -> Self {
        Self {
            stale_lock_secs: default_stale_lock_secs(),
            max_backups: default_max_backups(),
            backup_dir: default_backup_dir(),
        }
    }
}

fn default_stale_lock_secs() -> u64 {
    30
}

fn default_max_backups() -> usize {
    10
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("Backups")
}
