//! Pre-launch resolution: wrapper binaries and compat-layer environment.
//!
//! Everything here runs before any process spawns; a failure aborts the
//! launch with a reported reason and nothing to clean up.

use std::collections::HashMap;
use std::path::PathBuf;

use gamedock_protocol::Runner;

use crate::LaunchError;
use crate::compat::{CompatKind, CompatLayer};
use crate::config::GameConfig;

/// Resolved wrapper pieces for one launch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaunchPrep {
    pub mangohud_command: Option<Vec<String>>,
    pub gamescope_command: Option<Vec<String>>,
    pub gamemode_bin: Option<String>,
    pub steam_runtime: Option<Vec<String>>,
}

/// Compatibility-layer pieces for a non-native launch.
#[derive(Debug, Clone, PartialEq)]
pub struct CompatEnv {
    pub layer: CompatLayer,
    pub env: HashMap<String, String>,
}

/// Searches PATH for an executable.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Resolves the enabled wrapper tools for a launch.
///
/// A wrapper that is enabled but absent from PATH aborts the launch; a
/// disabled wrapper is simply skipped.
pub fn prepare_launch(config: &GameConfig, native: bool) -> Result<LaunchPrep, LaunchError> {
    let mut prep = LaunchPrep::default();

    if config.enable_mangohud {
        let bin = find_executable("mangohud")
            .ok_or_else(|| LaunchError::WrapperNotFound("mangohud".into()))?;
        prep.mangohud_command = Some(vec![bin.display().to_string(), "--dlsym".to_string()]);
    }

    if config.enable_gamescope {
        let bin = find_executable("gamescope")
            .ok_or_else(|| LaunchError::WrapperNotFound("gamescope".into()))?;
        let mut command = vec![bin.display().to_string()];
        command.extend(config.gamescope_args.iter().cloned());
        prep.gamescope_command = Some(command);
    }

    if config.enable_gamemode {
        let bin = find_executable("gamemoderun")
            .ok_or_else(|| LaunchError::WrapperNotFound("gamemoderun".into()))?;
        prep.gamemode_bin = Some(bin.display().to_string());
    }

    // The Steam runtime only wraps compatibility-layer launches.
    if !native && !config.steam_runtime.is_empty() {
        prep.steam_runtime = Some(config.steam_runtime.clone());
    }

    Ok(prep)
}

/// Resolves the compatibility layer and its environment for a non-native
/// launch.
///
/// Fails before any spawn when no layer is configured or its binary is
/// gone; the reported reason reaches the user as-is.
pub fn prepare_compat_launch(config: &GameConfig) -> Result<CompatEnv, LaunchError> {
    let layer = config
        .wine_version
        .clone()
        .ok_or(LaunchError::MissingCompatLayer)?;

    if !layer.binary.is_file() {
        return Err(LaunchError::CompatBinaryMissing(
            layer.binary.display().to_string(),
        ));
    }

    let mut env = HashMap::new();
    match layer.kind {
        CompatKind::Wine => {
            if !config.wine_prefix.is_empty() {
                env.insert("WINEPREFIX".to_string(), config.wine_prefix.clone());
            }
        }
        CompatKind::Proton => {
            if !config.wine_prefix.is_empty() {
                env.insert(
                    "STEAM_COMPAT_DATA_PATH".to_string(),
                    config.wine_prefix.clone(),
                );
            }
            if let Some(client) = &config.steam_client_path {
                env.insert("STEAM_COMPAT_CLIENT_INSTALL_PATH".to_string(), client.clone());
            }
        }
    }

    tracing::debug!(kind = ?layer.kind, binary = %layer.binary.display(), "compat layer resolved");
    Ok(CompatEnv { layer, env })
}

/// Identification variables exported to wrapper scripts.
pub fn wrapper_env_vars(app_name: &str, runner: Runner) -> HashMap<String, String> {
    HashMap::from([
        ("GAMEDOCK_APP_NAME".to_string(), app_name.to_string()),
        ("GAMEDOCK_APP_RUNNER".to_string(), runner.to_string()),
    ])
}
