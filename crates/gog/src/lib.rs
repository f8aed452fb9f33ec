//! GOG storefront backend.
//!
//! Drives the external `gogdl` downloader for install/update/repair/
//! import/save-sync/launch, reconciles DLC removal through the per-item
//! uninstallers the installer drops next to the game, and reports play
//! sessions to the GOG playtime service with offline retry.

pub mod commands;
pub mod dlc;
pub mod games;
pub mod mods;

pub use games::GogGames;
