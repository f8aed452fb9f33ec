//! Best-effort filesystem cleanup for uninstall.
//!
//! Cleanup runs before the registry entry is removed, so a crash
//! mid-cleanup leaves the registry still saying "was installed" and the
//! uninstall can be retried. Retried cleanup must therefore be idempotent:
//! a path that is already gone counts as cleaned, and individual failures
//! are logged without blocking the remaining steps.

use std::path::Path;

/// Removes a directory tree; missing paths count as already cleaned.
pub fn remove_dir_best_effort(path: &Path) {
    if !path.exists() {
        return;
    }
    match std::fs::remove_dir_all(path) {
        Ok(()) => tracing::info!(path = %path.display(), "removed directory"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove directory"),
    }
}

/// Removes a single file; missing paths count as already cleaned.
pub fn remove_file_best_effort(path: &Path) {
    if !path.exists() {
        return;
    }
    match std::fs::remove_file(path) {
        Ok(()) => tracing::info!(path = %path.display(), "removed file"),
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove file"),
    }
}
