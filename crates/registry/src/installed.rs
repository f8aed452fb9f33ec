//! Installed-games record store, one file per runner.

use std::path::PathBuf;
use std::sync::Mutex;

use gamedock_protocol::InstalledInfo;
use serde::{Deserialize, Serialize};

use crate::RegistryError;
use crate::file;

#[derive(Debug, Default, Serialize, Deserialize)]
struct InstalledFile {
    #[serde(default)]
    installed: Vec<InstalledInfo>,
}

/// Durable list of installed games, keyed by app name.
///
/// Workflows mutate entries only through this store, so the on-disk file
/// and the in-memory copy never diverge.
#[derive(Debug)]
pub struct InstalledStore {
    path: PathBuf,
    inner: Mutex<Vec<InstalledInfo>>,
}

impl InstalledStore {
    /// Loads the store; a missing file yields an empty store.
    pub fn load(path: PathBuf) -> Result<Self, RegistryError> {
        let contents: InstalledFile = file::read_or_default(&path)?;
        Ok(Self {
            path,
            inner: Mutex::new(contents.installed),
        })
    }

    pub fn list(&self) -> Vec<InstalledInfo> {
        self.inner.lock().unwrap().clone()
    }

    pub fn get(&self, app_name: &str) -> Option<InstalledInfo> {
        self.inner
            .lock()
            .unwrap()
            .iter()
            .find(|info| info.app_name == app_name)
            .cloned()
    }

    pub fn contains(&self, app_name: &str) -> bool {
        self.get(app_name).is_some()
    }

    /// Inserts or replaces the record for `info.app_name` and persists.
    pub fn insert(&self, info: InstalledInfo) -> Result<(), RegistryError> {
        let mut list = self.inner.lock().unwrap();
        match list.iter_mut().find(|i| i.app_name == info.app_name) {
            Some(existing) => *existing = info,
            None => list.push(info),
        }
        self.persist(&list)
    }

    /// Applies `mutate` to the record for `app_name` under the lock and
    /// persists. Returns whether a record existed.
    pub fn update<F>(&self, app_name: &str, mutate: F) -> Result<bool, RegistryError>
    where
        F: FnOnce(&mut InstalledInfo),
    {
        let mut list = self.inner.lock().unwrap();
        let Some(info) = list.iter_mut().find(|i| i.app_name == app_name) else {
            return Ok(false);
        };
        mutate(info);
        self.persist(&list)?;
        Ok(true)
    }

    /// Removes and returns the record for `app_name`, persisting the rest.
    pub fn remove(&self, app_name: &str) -> Result<Option<InstalledInfo>, RegistryError> {
        let mut list = self.inner.lock().unwrap();
        let Some(index) = list.iter().position(|i| i.app_name == app_name) else {
            return Ok(None);
        };
        let removed = list.remove(index);
        self.persist(&list)?;
        Ok(Some(removed))
    }

    fn persist(&self, list: &[InstalledInfo]) -> Result<(), RegistryError> {
        file::write(
            &self.path,
            &InstalledFile {
                installed: list.to_vec(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamedock_protocol::InstallPlatform;

    fn record(app: &str) -> InstalledInfo {
        InstalledInfo {
            app_name: app.into(),
            platform: InstallPlatform::Windows,
            executable: String::new(),
            install_path: format!("/games/{app}"),
            install_size: "1.0 GB".into(),
            version: "1.0".into(),
            build_id: "b1".into(),
            version_etag: String::new(),
            branch: None,
            language: "en-US".into(),
            installed_dlcs: vec![],
            pinned_version: false,
        }
    }

    #[test]
    fn insert_get_remove_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installed.json");
        let store = InstalledStore::load(path.clone()).unwrap();

        store.insert(record("a")).unwrap();
        store.insert(record("b")).unwrap();
        assert!(store.contains("a"));
        assert_eq!(store.list().len(), 2);

        let removed = store.remove("a").unwrap().unwrap();
        assert_eq!(removed.app_name, "a");
        assert!(!store.contains("a"));

        // Reload from disk: state survived.
        let reloaded = InstalledStore::load(path).unwrap();
        assert!(reloaded.contains("b"));
        assert!(!reloaded.contains("a"));
    }

    #[test]
    fn insert_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let store = InstalledStore::load(dir.path().join("installed.json")).unwrap();

        store.insert(record("a")).unwrap();
        let mut updated = record("a");
        updated.version = "2.0".into();
        store.insert(updated).unwrap();

        assert_eq!(store.list().len(), 1);
        assert_eq!(store.get("a").unwrap().version, "2.0");
    }

    #[test]
    fn update_mutates_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installed.json");
        let store = InstalledStore::load(path.clone()).unwrap();
        store.insert(record("a")).unwrap();

        let found = store
            .update("a", |info| info.install_path = "/mnt/games/a".into())
            .unwrap();
        assert!(found);

        let reloaded = InstalledStore::load(path).unwrap();
        assert_eq!(reloaded.get("a").unwrap().install_path, "/mnt/games/a");
    }

    #[test]
    fn update_missing_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let store = InstalledStore::load(dir.path().join("installed.json")).unwrap();
        assert!(!store.update("ghost", |_| {}).unwrap());
    }

    #[test]
    fn remove_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = InstalledStore::load(dir.path().join("installed.json")).unwrap();
        assert!(store.remove("ghost").unwrap().is_none());
    }
}
