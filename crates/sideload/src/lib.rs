//! Sideloaded games backend.
//!
//! Sideloaded games have no storefront CLI behind them: the user points
//! the launcher at an executable on disk. Launch runs that executable
//! directly through the environment composer (wrapper chain plus compat
//! layer for Windows programs); install/update/repair have no meaning.

pub mod games;

pub use games::SideloadGames;
