//! One dispatch surface over the per-storefront backends.
//!
//! The shell holds one [`StoreManager`] per runner and routes every
//! lifecycle intent through it; the variants all implement the same
//! [`GameManager`] contract, sharing the supervisor, parser, and stores
//! underneath.

use std::path::Path;

use gamedock_protocol::{
    ExecResult, GameInfo, GameStatus, InstallArgs, InstallPlatform, Runner, SaveLocation,
    UpdateOverrides,
};
use gamedock_runner::{GameError, GameManager, InstallResult, RemoveArgs};

pub use gamedock_gog::GogGames;
pub use gamedock_legendary::LegendaryGames;
pub use gamedock_nile::NileGames;
pub use gamedock_sideload::SideloadGames;

/// A backend selected by runner.
pub enum StoreManager {
    Legendary(LegendaryGames),
    Gog(GogGames),
    Nile(NileGames),
    Sideload(SideloadGames),
}

macro_rules! dispatch {
    ($self:expr, $method:ident($($arg:expr),*)) => {
        match $self {
            StoreManager::Legendary(games) => games.$method($($arg),*),
            StoreManager::Gog(games) => games.$method($($arg),*),
            StoreManager::Nile(games) => games.$method($($arg),*),
            StoreManager::Sideload(games) => games.$method($($arg),*),
        }
    };
}

macro_rules! dispatch_async {
    ($self:expr, $method:ident($($arg:expr),*)) => {
        match $self {
            StoreManager::Legendary(games) => games.$method($($arg),*).await,
            StoreManager::Gog(games) => games.$method($($arg),*).await,
            StoreManager::Nile(games) => games.$method($($arg),*).await,
            StoreManager::Sideload(games) => games.$method($($arg),*).await,
        }
    };
}

impl GameManager for StoreManager {
    fn runner(&self) -> Runner {
        dispatch!(self, runner())
    }

    fn game_info(&self, app_name: &str) -> Option<GameInfo> {
        dispatch!(self, game_info(app_name))
    }

    fn is_native(&self, app_name: &str) -> bool {
        dispatch!(self, is_native(app_name))
    }

    fn on_install_or_update_output(&self, app_name: &str, status: GameStatus, line: &str) {
        dispatch!(self, on_install_or_update_output(app_name, status, line))
    }

    async fn is_game_available(&self, app_name: &str) -> bool {
        dispatch_async!(self, is_game_available(app_name))
    }

    async fn import(
        &self,
        app_name: &str,
        path: &Path,
        platform: InstallPlatform,
    ) -> Result<ExecResult, GameError> {
        dispatch_async!(self, import(app_name, path, platform))
    }

    async fn install(&self, app_name: &str, args: &InstallArgs) -> Result<InstallResult, GameError> {
        dispatch_async!(self, install(app_name, args))
    }

    async fn update(
        &self,
        app_name: &str,
        overrides: Option<&UpdateOverrides>,
    ) -> Result<InstallResult, GameError> {
        dispatch_async!(self, update(app_name, overrides))
    }

    async fn repair(&self, app_name: &str) -> Result<ExecResult, GameError> {
        dispatch_async!(self, repair(app_name))
    }

    async fn uninstall(&self, args: &RemoveArgs) -> Result<ExecResult, GameError> {
        dispatch_async!(self, uninstall(args))
    }

    async fn move_install(
        &self,
        app_name: &str,
        new_base: &Path,
    ) -> Result<InstallResult, GameError> {
        dispatch_async!(self, move_install(app_name, new_base))
    }

    async fn launch(&self, app_name: &str, launch_args: &[String]) -> Result<bool, GameError> {
        dispatch_async!(self, launch(app_name, launch_args))
    }

    async fn sync_saves(
        &self,
        app_name: &str,
        direction: &str,
        locations: &[SaveLocation],
    ) -> Result<String, GameError> {
        dispatch_async!(self, sync_saves(app_name, direction, locations))
    }

    async fn stop(&self, app_name: &str, stop_compat: bool) -> Result<(), GameError> {
        dispatch_async!(self, stop(app_name, stop_compat))
    }
}
