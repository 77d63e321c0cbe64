use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::reader::ReaderError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// index.xml to import. When unset, the photo application's own
    /// configuration is consulted.
    #[serde(default)]
    pub index_xml: Option<PathBuf>,

    /// Directory for log files. Logs go to stderr when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    #[serde(default)]
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Skip the "are you sure" prompt.
    #[serde(default)]
    pub assume_yes: bool,

    /// Pre-answer the "clear old tables first" prompt.
    #[serde(default)]
    pub clear_first: Option<bool>,

    /// Print a progress dot every this many media items.
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,
}

fn default_progress_interval() -> usize {
    100
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            assume_yes: false,
            clear_first: None,
            progress_interval: default_progress_interval(),
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kpa-sql")
        .join("kphotoalbum.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            index_xml: None,
            log_dir: None,
            import: ImportConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            // Create default config
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kpa-sql")
    }

    fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }
}

/// Find the index.xml the photo application is configured to use.
///
/// kphotoalbumrc is not a well-formed ini file, so the `configfile=` line
/// is picked out by hand.
pub fn locate_index_xml() -> Result<PathBuf, ReaderError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ReaderError::Config("Could not determine the user configuration directory.".into()))?;
    index_xml_from_rc(&config_dir.join("kphotoalbumrc"))
}

pub fn index_xml_from_rc(rc_path: &Path) -> Result<PathBuf, ReaderError> {
    let content = std::fs::read_to_string(rc_path).map_err(|e| {
        ReaderError::Config(format!("Could not read {}: {}", rc_path.display(), e))
    })?;

    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("configfile="))
        .map(|value| PathBuf::from(value.trim()))
        .filter(|path| !path.as_os_str().is_empty())
        .ok_or_else(|| {
            ReaderError::Config(format!(
                "Could not fetch the index.xml path from {}.",
                rc_path.display()
            ))
        })
}
