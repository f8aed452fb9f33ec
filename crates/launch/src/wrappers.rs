//! Wrapper chain assembly.
//!
//! Wrappers nest outermost-first and the precedence order is fixed:
//! performance overlay, then gamescope/GameMode, then the Steam
//! compatibility runtime, then user-supplied wrappers. Layers assume this
//! nesting; the chain is concatenated, never reordered.

use crate::config::GameConfig;
use crate::prepare::LaunchPrep;

/// Builds the flat wrapper command prefix for a launch.
pub fn setup_wrappers(config: &GameConfig, prep: &LaunchPrep) -> Vec<String> {
    let mut chain: Vec<String> = Vec::new();

    if let Some(mangohud) = &prep.mangohud_command {
        chain.extend(mangohud.iter().cloned());
    }
    if let Some(gamescope) = &prep.gamescope_command {
        chain.extend(gamescope.iter().cloned());
    }
    if let Some(gamemode) = &prep.gamemode_bin {
        chain.push(gamemode.clone());
    }
    if let Some(runtime) = &prep.steam_runtime {
        chain.extend(runtime.iter().cloned());
    }
    for wrapper in &config.wrappers {
        if wrapper.executable.is_empty() {
            continue;
        }
        chain.push(wrapper.executable.clone());
        chain.extend(wrapper.args.iter().cloned());
    }

    chain
}

/// Joins wrapper tokens into the single string form backends expect for
/// their `--wrapper` flag.
pub fn join_wrappers(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|token| {
            if token.contains(char::is_whitespace) {
                format!("\"{token}\"")
            } else {
                token.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
