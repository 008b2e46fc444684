use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};

/// Running totals and bests for one user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserAggregate {
    pub tests_completed: u32,
    pub total_wpm: f64,
    pub best_wpm: u32,
    pub total_accuracy: f64,
    pub best_accuracy: f64,
}

impl UserAggregate {
    pub fn record(&mut self, wpm: u32, accuracy: f64) {
        self.tests_completed += 1;
        self.total_wpm += f64::from(wpm);
        self.total_accuracy += accuracy;
        self.best_wpm = self.best_wpm.max(wpm);
        if accuracy > self.best_accuracy {
            self.best_accuracy = accuracy;
        }
    }

    pub fn average_wpm(&self) -> Option<f64> {
        (self.tests_completed > 0).then(|| self.total_wpm / f64::from(self.tests_completed))
    }

    pub fn average_accuracy(&self) -> Option<f64> {
        (self.tests_completed > 0).then(|| self.total_accuracy / f64::from(self.tests_completed))
    }
}

/// Everything persisted between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Profiles {
    #[serde(default)]
    pub current_user: Option<String>,
    #[serde(default)]
    pub users: BTreeMap<String, UserAggregate>,
}

/// Where [`Profiles`] are kept.
pub trait ProfileBackend: Send {
    fn load(&self) -> Result<Profiles>;
    fn save(&self, profiles: &Profiles) -> Result<()>;
}

/// Pretty-printed JSON on disk.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where an unreadable store is moved before a fresh one replaces it.
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".bak");
        PathBuf::from(name)
    }

    fn read(&self) -> Result<Profiles> {
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl ProfileBackend for JsonFileBackend {
    fn load(&self) -> Result<Profiles> {
        if !self.path.exists() {
            return Ok(Profiles::default());
        }
        self.read().inspect_err(|e| {
            let backup = self.backup_path();
            match fs::rename(&self.path, &backup) {
                Ok(()) => tracing::warn!(
                    backup = %backup.display(),
                    "unreadable user data moved aside: {e}"
                ),
                Err(mv) => tracing::error!(
                    path = %self.path.display(),
                    "unreadable user data could not be moved aside: {mv}"
                ),
            }
        })
    }

    fn save(&self, profiles: &Profiles) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec_pretty(profiles)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// Keeps profiles in memory. Clones share storage; saves can be made to fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    stored: Arc<Mutex<Profiles>>,
    fail_saves: bool,
}

impl MemoryBackend {
    pub fn new(initial: Profiles) -> Self {
        Self {
            stored: Arc::new(Mutex::new(initial)),
            fail_saves: false,
        }
    }

    /// A backend whose every save returns an I/O error.
    pub fn read_only(initial: Profiles) -> Self {
        Self {
            fail_saves: true,
            ..Self::new(initial)
        }
    }

    pub fn snapshot(&self) -> Profiles {
        self.stored
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl ProfileBackend for MemoryBackend {
    fn load(&self) -> Result<Profiles> {
        Ok(self.snapshot())
    }

    fn save(&self, profiles: &Profiles) -> Result<()> {
        if self.fail_saves {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "store is read-only",
            )));
        }
        *self.stored.lock().unwrap_or_else(|e| e.into_inner()) = profiles.clone();
        Ok(())
    }
}

/// In-memory user aggregates with write-through to a backend.
///
/// Mutations always apply in memory; a failing save is reported to the
/// caller but never rolls anything back.
pub struct UserProfileStore {
    profiles: Profiles,
    backend: Box<dyn ProfileBackend>,
}

impl UserProfileStore {
    /// Loads from `backend`; unreadable data starts an empty store.
    pub fn open(backend: Box<dyn ProfileBackend>) -> Self {
        let profiles = backend.load().unwrap_or_else(|e| {
            tracing::warn!("could not load user data, starting fresh: {e}");
            Profiles::default()
        });
        let mut store = Self { profiles, backend };
        // A dangling active user would skip the user selection screen.
        if let Some(name) = store.profiles.current_user.clone() {
            if !store.profiles.users.contains_key(&name) {
                store.profiles.current_user = None;
            }
        }
        store
    }

    pub fn in_memory() -> Self {
        Self::open(Box::new(MemoryBackend::default()))
    }

    fn save(&self) -> Result<()> {
        self.backend.save(&self.profiles)
    }

    /// Adds one completed test to `username`, creating the user if needed.
    pub fn record(&mut self, username: &str, wpm: u32, accuracy: f64) -> Result<()> {
        self.profiles
            .users
            .entry(username.to_string())
            .or_default()
            .record(wpm, accuracy);
        tracing::info!(user = username, wpm, accuracy, "recorded test result");
        self.save()
    }

    /// Returns `false` when the user already existed.
    pub fn create_user(&mut self, username: &str) -> Result<bool> {
        if self.profiles.users.contains_key(username) {
            return Ok(false);
        }
        self.profiles
            .users
            .insert(username.to_string(), UserAggregate::default());
        self.save()?;
        Ok(true)
    }

    pub fn remove_user(&mut self, username: &str) -> Result<bool> {
        if self.profiles.users.remove(username).is_none() {
            return Ok(false);
        }
        if self.profiles.current_user.as_deref() == Some(username) {
            self.profiles.current_user = None;
        }
        self.save()?;
        Ok(true)
    }

    /// Makes an existing user active. Unknown names are refused.
    pub fn set_current_user(&mut self, username: &str) -> Result<bool> {
        if !self.profiles.users.contains_key(username) {
            return Ok(false);
        }
        self.profiles.current_user = Some(username.to_string());
        self.save()?;
        Ok(true)
    }

    pub fn current_user(&self) -> Option<&str> {
        self.profiles.current_user.as_deref()
    }

    pub fn user(&self, username: &str) -> Option<&UserAggregate> {
        self.profiles.users.get(username)
    }

    /// Usernames in alphabetical order, as numbered on the selection screens.
    pub fn usernames(&self) -> Vec<&str> {
        self.profiles.users.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.users.is_empty()
    }

    /// Top `limit` users by best WPM, ties broken by name.
    pub fn leaderboard(&self, limit: usize) -> Vec<(&str, &UserAggregate)> {
        self.profiles
            .users
            .iter()
            .sorted_by(|a, b| b.1.best_wpm.cmp(&a.1.best_wpm).then_with(|| a.0.cmp(b.0)))
            .take(limit)
            .map(|(name, agg)| (name.as_str(), agg))
            .collect()
    }

    pub fn profiles(&self) -> &Profiles {
        &self.profiles
    }
}

impl std::fmt::Debug for UserProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserProfileStore")
            .field("profiles", &self.profiles)
            .finish_non_exhaustive()
    }
}
