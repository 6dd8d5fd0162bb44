use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use crate::error::{AppError, AppResult};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const USER_KEY: &str = "user";
pub const CALENDAR_UNLOCKED_KEY: &str = "calendar_unlocked";

/// String key/value storage for client-side state.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// Store persisted as a JSON object on disk; survives restarts.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<dir>/session.json`
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_text(&self) -> AppResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn parse_map(text: &str) -> serde_json::Result<HashMap<String, String>> {
        if text.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(text)
    }

    fn read_map(&self) -> AppResult<HashMap<String, String>> {
        let Some(text) = self.read_text()? else {
            return Ok(HashMap::new());
        };
        Self::parse_map(&text).map_err(|e| {
            AppError::Storage(format!("Corrupt store at {}: {}", self.path.display(), e))
        })
    }

    /// Map to modify before a write. A corrupt file is discarded; the flag
    /// tells the caller the file must be rewritten.
    fn read_map_for_write(&self) -> AppResult<(HashMap<String, String>, bool)> {
        let Some(text) = self.read_text()? else {
            return Ok((HashMap::new(), false));
        };
        match Self::parse_map(&text) {
            Ok(map) => Ok((map, false)),
            Err(e) => {
                warn!("Discarding corrupt store at {}: {}", self.path.display(), e);
                Ok((HashMap::new(), true))
            }
        }
    }

    /// Written to a sibling temp file, then renamed over the store.
    fn write_map(&self, map: &HashMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn guard(&self) -> AppResult<std::sync::MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| AppError::Storage("store lock poisoned".to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let _guard = self.guard()?;
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let _guard = self.guard()?;
        let (mut map, _) = self.read_map_for_write()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let _guard = self.guard()?;
        let (mut map, corrupt) = self.read_map_for_write()?;
        if map.remove(key).is_some() || corrupt {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// Store that lives as long as the process (session-scoped state).
#[derive(Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let map = self
            .map
            .lock()
            .map_err(|_| AppError::Storage("store lock poisoned".to_string()))?;
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut map = self
            .map
            .lock()
            .map_err(|_| AppError::Storage("store lock poisoned".to_string()))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut map = self
            .map
            .lock()
            .map_err(|_| AppError::Storage("store lock poisoned".to_string()))?;
        map.remove(key);
        Ok(())
    }
}
