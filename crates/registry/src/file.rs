//! Shared JSON file persistence.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::RegistryError;

/// Reads a JSON file, returning the default value when the file is absent.
pub(crate) fn read_or_default<T>(path: &Path) -> Result<T, RegistryError>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Serializes `value` to `path`, creating parent directories as needed.
pub(crate) fn write<T: Serialize>(path: &Path, value: &T) -> Result<(), RegistryError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}
