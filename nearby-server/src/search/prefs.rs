//! Persistence for filter preferences.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::filters::FilterPreferences;

/// Errors from the preference store.
#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt preferences file: {message}")]
    Corrupt { message: String },
}

/// Simple get/set store for the user's filter preferences.
///
/// Rehydrated once at orchestrator startup and written through on every
/// filter change.
pub trait PreferenceStore: Send + Sync {
    /// Load saved preferences, `None` if nothing was ever saved.
    fn load(&self) -> Result<Option<FilterPreferences>, PrefsError>;

    /// Persist the given preferences.
    fn save(&self, prefs: &FilterPreferences) -> Result<(), PrefsError>;
}

/// JSON-file-backed preference store.
#[derive(Debug)]
pub struct JsonPreferenceStore {
    path: PathBuf,
}

impl JsonPreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn load(&self) -> Result<Option<FilterPreferences>, PrefsError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let prefs = serde_json::from_str(&contents).map_err(|e| PrefsError::Corrupt {
            message: e.to_string(),
        })?;
        Ok(Some(prefs))
    }

    fn save(&self, prefs: &FilterPreferences) -> Result<(), PrefsError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(prefs).map_err(|e| PrefsError::Corrupt {
            message: e.to_string(),
        })?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory store, for tests and for running without persistence.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    inner: Mutex<Option<FilterPreferences>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Option<FilterPreferences>, PrefsError> {
        let guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.clone())
    }

    fn save(&self, prefs: &FilterPreferences) -> Result<(), PrefsError> {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(prefs.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SchoolSector;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = JsonPreferenceStore::new(dir.path().join("prefs.json"));

        let prefs = FilterPreferences {
            school_sectors: [SchoolSector::Catholic].into_iter().collect(),
            school_levels: Default::default(),
        };

        store.save(&prefs).unwrap();
        assert_eq!(store.load().unwrap(), Some(prefs));
    }

    #[test]
    fn missing_file_loads_none() {
        let dir = tempdir().unwrap();
        let store = JsonPreferenceStore::new(dir.path().join("prefs.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonPreferenceStore::new(path);
        assert!(matches!(store.load(), Err(PrefsError::Corrupt { .. })));
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");
        let store = JsonPreferenceStore::new(&path);

        store.save(&FilterPreferences::default()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryPreferenceStore::new();
        assert!(store.load().unwrap().is_none());

        let prefs = FilterPreferences::default();
        store.save(&prefs).unwrap();
        assert_eq!(store.load().unwrap(), Some(prefs));
    }
}
