//! Mod deployment pre-launch step.
//!
//! Games with the REDmod plugin system need their selected mods deployed
//! by the bundled tool before launch. The deploy runs synchronously; an
//! ordinary failure is logged and the launch proceeds, but output carrying
//! the structural failure marker aborts the launch.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Deploy tool binary, shipped inside the game directory.
pub const MOD_DEPLOY_TOOL: &str = "redMod.exe";

const FAILURE_MARKER: &str = "deploy has failed";

/// Per-game mod configuration, persisted in a keyed store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModConfig {
    pub enabled: bool,
    pub mods_to_load: Vec<String>,
}

/// Directory holding the deploy tool, when the game ships it.
pub fn deploy_tool_dir(install_path: &Path) -> PathBuf {
    install_path.join("tools").join("redmod").join("bin")
}

/// Mods present on disk: `mods/<name>/info.json`.
pub fn available_mods(install_path: &Path) -> Vec<String> {
    let mods_path = install_path.join("mods");
    let Ok(entries) = std::fs::read_dir(&mods_path) else {
        return Vec::new();
    };

    let mut mods: Vec<String> = entries
        .flatten()
        .filter(|entry| {
            entry.path().is_dir() && entry.path().join("info.json").exists()
        })
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    mods.sort();
    mods
}

/// Arguments for the deploy tool.
pub fn deploy_args(install_dir: &str, mods: &[String]) -> Vec<String> {
    let mut parts = vec![
        "deploy".to_string(),
        "-reportProgress".to_string(),
        "-root".to_string(),
        install_dir.to_string(),
    ];
    for name in mods {
        parts.push("-mod".to_string());
        parts.push(name.clone());
    }
    parts
}

/// Whether tool output indicates a structural deploy failure.
pub fn deploy_failed(output: &str) -> bool {
    output.contains(FAILURE_MARKER)
}
