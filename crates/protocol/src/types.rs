//! Core domain types: runners, platforms, game identity and installed state.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Storefront backend a game belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runner {
    Legendary,
    Gog,
    Nile,
    Sideload,
}

impl Runner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Runner::Legendary => "legendary",
            Runner::Gog => "gog",
            Runner::Nile => "nile",
            Runner::Sideload => "sideload",
        }
    }
}

impl fmt::Display for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform a game build targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallPlatform {
    Windows,
    Osx,
    Linux,
}

impl InstallPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallPlatform::Windows => "windows",
            InstallPlatform::Osx => "osx",
            InstallPlatform::Linux => "linux",
        }
    }

    /// Whether a build for this platform runs without a compatibility layer
    /// on the given host.
    pub fn is_native_on(&self, host: HostPlatform) -> bool {
        matches!(
            (host, self),
            (HostPlatform::Windows, _)
                | (HostPlatform::Mac, InstallPlatform::Osx)
                | (HostPlatform::Linux, InstallPlatform::Linux)
        )
    }
}

impl fmt::Display for InstallPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform the launcher itself runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
    Windows,
    Mac,
    Linux,
}

impl HostPlatform {
    pub fn current() -> Self {
        if cfg!(windows) {
            HostPlatform::Windows
        } else if cfg!(target_os = "macos") {
            HostPlatform::Mac
        } else {
            HostPlatform::Linux
        }
    }
}

/// Durable record of one installed game build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledInfo {
    pub app_name: String,
    pub platform: InstallPlatform,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub executable: String,
    pub install_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub install_size: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub build_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version_etag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub installed_dlcs: Vec<String>,
    #[serde(default)]
    pub pinned_version: bool,
}

impl InstalledInfo {
    /// Whether the recorded install directory still exists on disk.
    ///
    /// A record whose directory is gone is reported as "appears deleted",
    /// never silently repaired.
    pub fn path_exists(&self) -> bool {
        Path::new(&self.install_path).exists()
    }
}

/// A library entry: display metadata plus installed state.
///
/// Owned by the registry; workflows mutate it and re-persist immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub app_name: String,
    pub runner: Runner,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub art_cover: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub art_square: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub folder_name: String,
    #[serde(default)]
    pub is_installed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<InstalledInfo>,
    #[serde(default)]
    pub can_run_offline: bool,
}

/// Arguments for a fresh install.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallArgs {
    pub path: String,
    pub platform: InstallPlatform,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub install_dlcs: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl InstallArgs {
    /// Validates the arguments against a backend's supported platform set.
    ///
    /// Runs before any command construction; a failure here must never
    /// reach the process supervisor.
    pub fn validate(&self, supported: &[InstallPlatform]) -> Result<(), ValidationError> {
        if self.path.trim().is_empty() {
            return Err(ValidationError("install path is empty".into()));
        }
        if !supported.contains(&self.platform) {
            return Err(ValidationError(format!(
                "platform {} is not supported by this backend",
                self.platform
            )));
        }
        Ok(())
    }
}

/// Caller-supplied overrides for an update.
///
/// `dlcs: None` means "keep the installed DLC set"; `Some(vec![])` means
/// "remove all DLCs".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dlcs: Option<Vec<String>>,
}

/// Malformed lifecycle arguments, rejected before any subprocess spawns.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// One cloud-save location for save-sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveLocation {
    pub name: String,
    pub path: String,
}

/// Normalized result of one supervised subprocess.
///
/// Exactly one of success, `error`, or `abort` is the operative outcome;
/// callers must check `abort` before `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecResult {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub abort: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        !self.abort && self.error.is_none()
    }
}

/// Lifecycle status vocabulary of the event surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Installing,
    Updating,
    Repairing,
    Uninstalling,
    Moving,
    Playing,
    Done,
}
