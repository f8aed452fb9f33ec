//! Launch environment composition.
//!
//! A native game is handed to the process supervisor as-is. A non-native
//! game goes through three steps first: resolve the compatibility layer
//! from the game's configuration, build the wrapper chain in its fixed
//! precedence order, and merge environment variables layer by layer.

pub mod compat;
pub mod config;
pub mod env;
pub mod prepare;
pub mod wrappers;

pub use compat::{CompatKind, CompatLayer, wine_flags, wineserver_path};
pub use config::{GameConfig, GlobalConfig, WrapperTool};
pub use env::merge_env_layers;
pub use prepare::{
    CompatEnv, LaunchPrep, find_executable, prepare_compat_launch, prepare_launch,
    wrapper_env_vars,
};
pub use wrappers::{join_wrappers, setup_wrappers};

/// Errors raised while composing a launch, all before any process spawns.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    /// The game needs a compatibility layer but none is configured.
    #[error("no compatibility layer configured")]
    MissingCompatLayer,

    #[error("compatibility layer binary not found: {0}")]
    CompatBinaryMissing(String),

    #[error("wrapper enabled but not found in PATH: {0}")]
    WrapperNotFound(String),
}

/// Renders a supervisor invocation for game logs, with secrets redacted.
pub fn format_launch_command(binary: &std::path::Path, args: &[String]) -> String {
    let mut parts = vec![quote(&binary.display().to_string())];
    let mut redact_next = false;
    for arg in args {
        if redact_next {
            parts.push("<redacted>".to_string());
            redact_next = false;
            continue;
        }
        if arg == "--password" {
            redact_next = true;
        }
        parts.push(quote(arg));
    }
    parts.join(" ")
}

fn quote(token: &str) -> String {
    if token.contains(char::is_whitespace) {
        format!("\"{token}\"")
    } else {
        token.to_string()
    }
}
