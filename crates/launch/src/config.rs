//! Per-game and global configuration types.
//!
//! Loading and validating these from disk belongs to the shell; the core
//! only consumes them through the config provider contract.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::compat::CompatLayer;

/// A user-supplied wrapper command, outermost in the wrapper chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapperTool {
    pub executable: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

/// Per-game launch configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameConfig {
    /// Compatibility layer used for non-native games.
    pub wine_version: Option<CompatLayer>,
    /// Prefix directory for the compatibility layer.
    pub wine_prefix: String,
    pub enable_mangohud: bool,
    pub enable_gamemode: bool,
    pub enable_gamescope: bool,
    pub gamescope_args: Vec<String>,
    /// Steam compatibility runtime invocation, empty when unused.
    pub steam_runtime: Vec<String>,
    pub steam_client_path: Option<String>,
    pub wrappers: Vec<WrapperTool>,
    /// Per-game environment overrides; highest precedence on collision.
    pub env: HashMap<String, String>,
    /// Overrides the executable the backend would launch.
    pub target_exe: Option<String>,
    /// Extra arguments appended to every launch.
    pub launcher_args: Vec<String>,
}

/// Process-wide configuration, initialized once at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalConfig {
    pub max_download_workers: Option<u32>,
    pub disable_logs: bool,
}
