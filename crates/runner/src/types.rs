//! Workflow result and argument types.

use serde::{Deserialize, Serialize};

/// Terminal state of an install-like workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallStatus {
    Done,
    Error,
    Abort,
}

/// Outcome of install/update/move workflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallResult {
    pub status: InstallStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstallResult {
    pub fn done() -> Self {
        Self {
            status: InstallStatus::Done,
            error: None,
        }
    }

    pub fn aborted() -> Self {
        Self {
            status: InstallStatus::Abort,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: InstallStatus::Error,
            error: Some(error.into()),
        }
    }
}

/// Arguments for an uninstall.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveArgs {
    pub app_name: String,
    /// Also delete the game's files from disk.
    #[serde(default)]
    pub delete_files: bool,
    /// Also delete the compatibility-layer prefix.
    #[serde(default)]
    pub remove_prefix: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_constructors() {
        assert_eq!(InstallResult::done().status, InstallStatus::Done);
        assert_eq!(InstallResult::aborted().status, InstallStatus::Abort);
        let failed = InstallResult::failed("boom");
        assert_eq!(failed.status, InstallStatus::Error);
        assert_eq!(failed.error.as_deref(), Some("boom"));
    }
}
