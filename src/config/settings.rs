use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The periodic cycle must run at least once a minute.
pub const MAX_REFRESH_SECS: u64 = 60;

fn default_ipc_port() -> u16 {
    47615
}
fn default_refresh_secs() -> u64 {
    MAX_REFRESH_SECS
}
fn default_poll_millis() -> u64 {
    1000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimetableConfig {
    /// JSON timetable; defaults to `timetable.json` in the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Loopback port the daemon answers `GET_STATE` / `FORCE_REFRESH` on.
    #[serde(default = "default_ipc_port")]
    pub ipc_port: u16,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    /// How often due alarms are checked.
    #[serde(default = "default_poll_millis")]
    pub poll_millis: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            ipc_port: default_ipc_port(),
            refresh_secs: default_refresh_secs(),
            poll_millis: default_poll_millis(),
        }
    }
}

impl DaemonConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.clamp(1, MAX_REFRESH_SECS))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_millis.clamp(50, 60_000))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BadgeConfig {
    /// File the badge text is written to; defaults to `badge.txt` in the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub timetable: TimetableConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub badge: BadgeConfig,
}

impl AppConfig {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "next-prayer")
            .context("Could not determine project directories")
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn db_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("next-prayer.db"))
    }

    pub fn timetable_path(&self) -> Result<PathBuf> {
        match &self.timetable.path {
            Some(p) => Ok(p.clone()),
            None => Ok(Self::data_dir()?.join("timetable.json")),
        }
    }

    pub fn badge_path(&self) -> Result<PathBuf> {
        match &self.badge.path {
            Some(p) => Ok(p.clone()),
            None => Ok(Self::data_dir()?.join("badge.txt")),
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Reading {:?}", path))?;
        let config: AppConfig = toml::from_str(&content).context("Parsing config.toml")?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Serializing config")?;
        std::fs::write(path, content).with_context(|| format!("Writing {:?}", path))?;
        Ok(())
    }

    pub fn ensure_data_dir() -> Result<PathBuf> {
        let dir = Self::data_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
