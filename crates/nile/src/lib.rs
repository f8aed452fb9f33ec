//! Amazon Games storefront backend.
//!
//! Drives the external `nile` CLI. Amazon ships Windows builds only, has
//! no DLC surface, no branches, and no cloud-save service; its workflows
//! are the lean variant of the shared lifecycle skeleton.

pub mod commands;
pub mod games;

pub use games::NileGames;
