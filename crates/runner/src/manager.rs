//! The per-backend lifecycle contract.

use std::path::Path;

use gamedock_protocol::{
    ExecResult, GameInfo, GameStatus, InstallArgs, InstallPlatform, SaveLocation, UpdateOverrides,
};

use crate::error::GameError;
use crate::types::{InstallResult, RemoveArgs};

/// One storefront backend's lifecycle workflows.
///
/// Every operation is a short, mostly-linear protocol built from the
/// shared collaborators: build the command, run it under supervision,
/// persist only after the process stage fully completed. Pre-flight
/// failures (credentials, validation) surface as `Err` before anything
/// spawns; process-stage outcomes surface inside the `Ok` payload, with
/// abort checked before error.
#[allow(async_fn_in_trait)]
pub trait GameManager {
    fn runner(&self) -> gamedock_protocol::Runner;

    /// The library's current view of a game.
    fn game_info(&self, app_name: &str) -> Option<GameInfo>;

    /// Whether the installed build runs without a compatibility layer.
    fn is_native(&self, app_name: &str) -> bool;

    /// Feeds one raw backend output line during install/update.
    fn on_install_or_update_output(&self, app_name: &str, status: GameStatus, line: &str);

    /// Installed and its directory still present on disk.
    async fn is_game_available(&self, app_name: &str) -> bool;

    /// Registers an existing on-disk copy with the backend.
    async fn import(
        &self,
        app_name: &str,
        path: &Path,
        platform: InstallPlatform,
    ) -> Result<ExecResult, GameError>;

    async fn install(&self, app_name: &str, args: &InstallArgs) -> Result<InstallResult, GameError>;

    async fn update(
        &self,
        app_name: &str,
        overrides: Option<&UpdateOverrides>,
    ) -> Result<InstallResult, GameError>;

    /// Verifies and repairs game files against the persisted manifest.
    async fn repair(&self, app_name: &str) -> Result<ExecResult, GameError>;

    async fn uninstall(&self, args: &RemoveArgs) -> Result<ExecResult, GameError>;

    /// Relocates the install; the registry records the new path only
    /// after the files have actually moved.
    async fn move_install(
        &self,
        app_name: &str,
        new_base: &Path,
    ) -> Result<InstallResult, GameError>;

    /// Launches the game. `Ok(true)` covers both a clean exit and a
    /// user-requested abort.
    async fn launch(&self, app_name: &str, launch_args: &[String]) -> Result<bool, GameError>;

    /// Synchronizes cloud saves; returns the backend's combined output.
    async fn sync_saves(
        &self,
        app_name: &str,
        direction: &str,
        locations: &[SaveLocation],
    ) -> Result<String, GameError>;

    /// Stops a running game, optionally shutting the compat layer down.
    async fn stop(&self, app_name: &str, stop_compat: bool) -> Result<(), GameError>;
}
