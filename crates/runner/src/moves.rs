//! Install relocation.
//!
//! The files move first; callers update the registry only after success,
//! so a failed move leaves the original record untouched.

use std::path::Path;

use crate::error::GameError;

/// Moves a game directory to a new location.
///
/// Tries a rename first; a cross-device rename falls back to a recursive
/// copy followed by removal of the source.
pub fn move_game_directory(src: &Path, dest: &Path) -> Result<(), GameError> {
    if !src.exists() {
        return Err(GameError::Filesystem(format!(
            "source directory missing: {}",
            src.display()
        )));
    }
    if dest.exists() {
        return Err(GameError::Filesystem(format!(
            "destination already exists: {}",
            dest.display()
        )));
    }
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| GameError::Filesystem(format!("failed to create {}: {e}", parent.display())))?;
    }

    match std::fs::rename(src, dest) {
        Ok(()) => {
            tracing::info!(from = %src.display(), to = %dest.display(), "moved install");
            Ok(())
        }
        Err(rename_err) => {
            tracing::debug!(error = %rename_err, "rename failed, copying across devices");
            copy_dir_recursive(src, dest)
                .map_err(|e| GameError::Filesystem(format!("copy failed: {e}")))?;
            std::fs::remove_dir_all(src)
                .map_err(|e| GameError::Filesystem(format!("failed to remove source: {e}")))?;
            tracing::info!(from = %src.display(), to = %dest.display(), "moved install (copy)");
            Ok(())
        }
    }
}

fn copy_dir_recursive(src: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_renames_directory() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("old").join("Game");
        std::fs::create_dir_all(src.join("data")).unwrap();
        std::fs::write(src.join("data").join("a.pak"), b"bytes").unwrap();

        let dest = dir.path().join("new").join("Game");
        move_game_directory(&src, &dest).unwrap();

        assert!(!src.exists());
        assert_eq!(
            std::fs::read(dest.join("data").join("a.pak")).unwrap(),
            b"bytes"
        );
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = move_game_directory(&dir.path().join("ghost"), &dir.path().join("dest"))
            .unwrap_err();
        assert!(matches!(err, GameError::Filesystem(_)));
    }

    #[test]
    fn existing_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&dest).unwrap();
        let err = move_game_directory(&src, &dest).unwrap_err();
        assert!(matches!(err, GameError::Filesystem(_)));
        // The source must survive a failed move.
        assert!(src.exists());
    }
}
