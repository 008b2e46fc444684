use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::mode::{DEFAULT_SPRINT_SECS, DEFAULT_WORD_TARGET};
use crate::text::DEFAULT_WORDS_PER_LINE;

pub const DEFAULT_TICK_RATE_MS: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sprint_secs: u64,
    pub word_target: usize,
    pub words_per_line: usize,
    pub tick_rate_ms: u64,
    pub theme: String,
    pub texts_file: Option<PathBuf>,
    pub users_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sprint_secs: DEFAULT_SPRINT_SECS,
            word_target: DEFAULT_WORD_TARGET,
            words_per_line: DEFAULT_WORDS_PER_LINE,
            tick_rate_ms: DEFAULT_TICK_RATE_MS,
            theme: "Dark".to_string(),
            texts_file: None,
            users_file: None,
        }
    }
}

impl Config {
    /// Replaces zero values that would stall or break a session.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if self.sprint_secs == 0 {
            self.sprint_secs = defaults.sprint_secs;
        }
        if self.word_target == 0 {
            self.word_target = defaults.word_target;
        }
        if self.words_per_line == 0 {
            self.words_per_line = defaults.words_per_line;
        }
        if self.tick_rate_ms == 0 {
            self.tick_rate_ms = defaults.tick_rate_ms;
        }
        self
    }

    pub fn users_path(&self) -> PathBuf {
        self.users_file.clone().unwrap_or_else(AppDirs::users_path)
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
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
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
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg.sanitized(),
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), "ignoring malformed config: {e}")
                }
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
