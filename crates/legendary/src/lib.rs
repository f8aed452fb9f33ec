//! Epic Games storefront backend.
//!
//! Drives the external `legendary` CLI. Epic has no branches, private
//! passwords, or playtime service; what remains is the shared lifecycle
//! skeleton with legendary's own platform dialect (`Windows`/`Mac`).

pub mod commands;
pub mod games;

pub use games::LegendaryGames;
