use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::session::GameConfig;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub respawn_delay_ms: u64,
    pub countdown_from: u8,
    pub seed: Option<u64>,
    /// When false, scores stay local and the SQLite record is skipped.
    pub use_db: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            respawn_delay_ms: 1500,
            countdown_from: 3,
            seed: None,
            use_db: true,
        }
    }
}

impl Config {
    pub fn to_game_config(&self) -> GameConfig {
        GameConfig {
            respawn_delay_ms: self.respawn_delay_ms,
            countdown_from: self.countdown_from,
            ..GameConfig::default()
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "fokus") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("fokus_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<Config>(&bytes) {
                return cfg;
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
