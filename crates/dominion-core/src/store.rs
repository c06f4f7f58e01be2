//! Persistence: the save-bundle store.
//!
//! The store object is created at process start and handed to the engine
//! (dependency injection); it is read once at genesis/resume and written
//! after every committed turn. Writing is a fire-and-forget side effect of
//! commit -- a failed write is logged, never allowed to abort a turn.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use dominion_types::{SaveBundle, SaveError, migrate};

/// Errors produced by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the save file failed.
    #[error("store I/O failed: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The save document could not be hydrated.
    #[error(transparent)]
    Save(#[from] SaveError),

    /// Serializing the bundle failed.
    #[error("serialization failed: {source}")]
    Json {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },
}

/// A place the committed world can be loaded from and saved to.
pub trait WorldStore {
    /// Load the save bundle, or `None` if nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the document exists but cannot be read or
    /// hydrated.
    fn load(&self) -> Result<Option<SaveBundle>, StoreError>;

    /// Persist the bundle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the document cannot be written.
    fn save(&self, bundle: &SaveBundle) -> Result<(), StoreError>;

    /// Discard any persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the document exists but cannot be removed.
    fn reset(&self) -> Result<(), StoreError>;
}

/// File-backed store holding one JSON save bundle.
///
/// Writes go through a sibling temp file and an atomic rename, so a crash
/// mid-write never corrupts the previous save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store over the given save path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The save path this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl WorldStore for JsonFileStore {
    fn load(&self) -> Result<Option<SaveBundle>, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no save bundle on disk");
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        let document: serde_json::Value = serde_json::from_str(&contents)?;
        let bundle = migrate(document)?;

        info!(
            path = %self.path.display(),
            epoch = bundle.state.time.epoch,
            "save bundle loaded"
        );
        Ok(Some(bundle))
    }

    fn save(&self, bundle: &SaveBundle) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(bundle)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;

        debug!(
            path = %self.path.display(),
            epoch = bundle.state.time.epoch,
            "save bundle written"
        );
        Ok(())
    }

    fn reset(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!(path = %self.path.display(), "save bundle removed");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dominion_types::ToolArchive;

    use crate::genesis;
    use crate::oracle::StubOracle;

    use super::*;

    fn make_bundle() -> SaveBundle {
        let mut oracle = StubOracle::new();
        let config = crate::config::WorldConfig {
            theme: "ashen".to_string(),
            seed: 11,
            width: 8,
            height: 8,
            factions: 2,
        };
        let state = genesis::generate(&config, &mut oracle).unwrap();
        SaveBundle::new(state, ToolArchive::default())
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("world.json"));

        let bundle = make_bundle();
        store.save(&bundle).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, bundle);
    }

    #[test]
    fn empty_store_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("world.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn reset_discards_the_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("world.json"));

        store.save(&make_bundle()).unwrap();
        store.reset().unwrap();
        assert!(store.load().unwrap().is_none());

        // Resetting an already-empty store is fine.
        store.reset().unwrap();
    }

    #[test]
    fn garbage_on_disk_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(path);
        assert!(matches!(store.load(), Err(StoreError::Json { .. })));
    }

    #[test]
    fn corrupt_document_is_a_save_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let store = JsonFileStore::new(path);
        assert!(matches!(store.load(), Err(StoreError::Save(_))));
    }
}
