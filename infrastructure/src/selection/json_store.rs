//! JSON file selection store.
//!
//! The whole store is one JSON object mapping work-item id to the ordered
//! list of agent identities. Every save rewrites the file through a
//! temporary sibling and a rename, so readers never see a half-written file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;
use verdict_application::{SelectionStore, StoreError};
use verdict_domain::AgentIdentity;

type Selections = BTreeMap<String, Vec<AgentIdentity>>;

/// [`SelectionStore`] backed by a JSON file
pub struct JsonSelectionStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl JsonSelectionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Selections, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Selections::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Selections::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupt(format!("{}: {}", self.path.display(), e)))
    }

    fn write_all(&self, selections: &Selections) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(selections)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SelectionStore for JsonSelectionStore {
    fn load(&self, work_item_id: &str) -> Result<Option<Vec<AgentIdentity>>, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(self.read_all()?.remove(work_item_id))
    }

    fn save(&self, work_item_id: &str, agents: &[AgentIdentity]) -> Result<(), StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let mut selections = self.read_all()?;
        selections.insert(work_item_id.to_string(), agents.to_vec());
        self.write_all(&selections)?;
        debug!(
            "Stored selection for {} in {}",
            work_item_id,
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSelectionStore::new(dir.path().join("selections.json"));
        assert!(store.load("story-1").unwrap().is_none());
    }

    #[test]
    fn test_save_then_load_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("selections.json");
        let agents = vec![
            AgentIdentity::universal("validator-general"),
            AgentIdentity::domain("validator-api"),
        ];

        JsonSelectionStore::new(&path).save("story-1", &agents).unwrap();
        JsonSelectionStore::new(&path)
            .save("story-2", &[AgentIdentity::feature("validator-payments")])
            .unwrap();

        let store = JsonSelectionStore::new(&path);
        assert_eq!(store.load("story-1").unwrap(), Some(agents));
        assert_eq!(
            store.load("story-2").unwrap(),
            Some(vec![AgentIdentity::feature("validator-payments")])
        );
        assert!(!dir.path().join("nested").join("selections.json.tmp").exists());
    }

    #[test]
    fn test_save_overwrites_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSelectionStore::new(dir.path().join("selections.json"));
        store
            .save("story-1", &[AgentIdentity::domain("validator-api")])
            .unwrap();
        store
            .save("story-1", &[AgentIdentity::domain("validator-database")])
            .unwrap();

        assert_eq!(
            store.load("story-1").unwrap(),
            Some(vec![AgentIdentity::domain("validator-database")])
        );
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selections.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonSelectionStore::new(&path).load("story-1").unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
