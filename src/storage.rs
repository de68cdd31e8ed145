//! Key-value persistence on disk.
//!
//! Each key is stored as its own pretty-printed JSON document in
//! `<storage dir>/<key>.json`. The default storage directory lives under the
//! platform config directory; a custom directory can be supplied on the
//! command line.

use crate::{QueryRunnerError, QueryRunnerResult};

use serde::{Serialize, de::DeserializeOwned};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// Subdirectory of the platform config directory used by default.
pub const STORAGE_DIR_NAME: &str = "sql-query-runner";

/// Key of the persisted theme flag (`true` means dark mode).
pub const KEY_DARK_MODE: &str = "darkMode";

/// Key of the persisted saved-query list.
pub const KEY_SAVED_QUERIES: &str = "savedQueries";

/// Key of the persisted recent-query list.
pub const KEY_RECENT_QUERIES: &str = "recentQueries";

/// A directory-backed key-value store.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: PathBuf) -> Self {
        Storage { dir }
    }

    /// The default storage directory: `<config dir>/sql-query-runner`.
    ///
    /// Fails only when the platform config directory cannot be determined.
    pub fn default_dir() -> QueryRunnerResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(STORAGE_DIR_NAME))
            .ok_or_else(|| QueryRunnerError::StorageDir(PathBuf::from(STORAGE_DIR_NAME)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Reads and deserializes the value stored under `key`.
    ///
    /// A missing file and a corrupt file both yield `None`: persisted state
    /// is best effort and never blocks startup.
    pub fn read_key<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.key_path(key);
        if !path.exists() {
            debug!("read_key: no file for key {key:?}");
            return None;
        }

        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(err) => {
                warn!("read_key: failed to read {path:?}: {err}");
                return None;
            }
        };

        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("read_key: corrupt value for key {key:?}: {err}");
                None
            }
        }
    }

    /// Serializes `value` and writes it under `key`, creating the storage
    /// directory on first use.
    pub fn write_key<T: Serialize>(&self, key: &str, value: &T) -> QueryRunnerResult<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .map_err(|_| QueryRunnerError::StorageDir(self.dir.clone()))?;
        }

        let path = self.key_path(key);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)?;
        debug!("write_key: wrote key {key:?} to {path:?}");
        Ok(())
    }
}

//----------------------------------------------------------------------------//
//                                   Tests                                    //
//----------------------------------------------------------------------------//

/// Run tests with:
/// `cargo test -- --show-output tests_storage`
#[cfg(test)]
mod tests_storage {
    use super::*;

    #[test]
    fn round_trip_bool() -> QueryRunnerResult<()> {
        let dir = tempfile::tempdir()?;
        let storage = Storage::new(dir.path().to_path_buf());

        storage.write_key(KEY_DARK_MODE, &true)?;
        assert_eq!(storage.read_key::<bool>(KEY_DARK_MODE), Some(true));

        storage.write_key(KEY_DARK_MODE, &false)?;
        assert_eq!(storage.read_key::<bool>(KEY_DARK_MODE), Some(false));
        Ok(())
    }

    #[test]
    fn each_key_is_its_own_file() -> QueryRunnerResult<()> {
        let dir = tempfile::tempdir()?;
        let storage = Storage::new(dir.path().to_path_buf());

        storage.write_key(KEY_DARK_MODE, &true)?;
        storage.write_key(KEY_RECENT_QUERIES, &vec!["SELECT * FROM customers;"])?;

        assert!(dir.path().join("darkMode.json").exists());
        assert!(dir.path().join("recentQueries.json").exists());
        Ok(())
    }

    #[test]
    fn missing_key_reads_as_none() -> QueryRunnerResult<()> {
        let dir = tempfile::tempdir()?;
        let storage = Storage::new(dir.path().to_path_buf());

        assert_eq!(storage.read_key::<bool>(KEY_DARK_MODE), None);
        Ok(())
    }

    #[test]
    fn corrupt_key_reads_as_none() -> QueryRunnerResult<()> {
        let dir = tempfile::tempdir()?;
        let storage = Storage::new(dir.path().to_path_buf());

        fs::write(storage.key_path(KEY_DARK_MODE), "not json at all")?;
        assert_eq!(storage.read_key::<bool>(KEY_DARK_MODE), None);
        Ok(())
    }

    #[test]
    fn write_creates_the_storage_directory() -> QueryRunnerResult<()> {
        let dir = tempfile::tempdir()?;
        let nested = dir.path().join("deeper").join("still");
        let storage = Storage::new(nested.clone());
        assert!(!nested.exists());

        storage.write_key(KEY_DARK_MODE, &true)?;
        assert!(nested.exists());
        Ok(())
    }
}
