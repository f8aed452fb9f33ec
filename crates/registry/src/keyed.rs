//! Generic keyed JSON store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::RegistryError;
use crate::file;

/// A durable `key → value` map.
///
/// Used for save-sync cursors, private branch passwords, and the playtime
/// retry queue (where a reserved `"lock"` key doubles as a drain marker).
#[derive(Debug)]
pub struct KeyedStore<T> {
    path: PathBuf,
    inner: Mutex<HashMap<String, T>>,
}

impl<T> KeyedStore<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    /// Loads the store; a missing file yields an empty map.
    pub fn load(path: PathBuf) -> Result<Self, RegistryError> {
        let map: HashMap<String, T> = file::read_or_default(&path)?;
        Ok(Self {
            path,
            inner: Mutex::new(map),
        })
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.inner.lock().unwrap().get(key).cloned()
    }

    /// Returns the stored value or `default` when the key is absent.
    pub fn get_or(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.inner.lock().unwrap().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().unwrap().keys().cloned().collect()
    }

    pub fn set(&self, key: &str, value: T) -> Result<(), RegistryError> {
        let mut map = self.inner.lock().unwrap();
        map.insert(key.to_string(), value);
        file::write(&self.path, &*map)
    }

    pub fn remove(&self, key: &str) -> Result<Option<T>, RegistryError> {
        let mut map = self.inner.lock().unwrap();
        let removed = map.remove(key);
        if removed.is_some() {
            file::write(&self.path, &*map)?;
        }
        Ok(removed)
    }
}
