//! Compatibility layer resolution and backend flag rendering.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Kind of Windows-compatibility runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatKind {
    Wine,
    Proton,
}

/// A resolved compatibility layer from the game's configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatLayer {
    pub kind: CompatKind,
    pub binary: PathBuf,
}

/// Renders the backend CLI flags selecting the compatibility layer.
///
/// Plain wine takes the binary directly; proton must itself be invoked as
/// a wrapper around the game (`<wrappers> "<proton>" run`), so it folds
/// into the wrapper string instead.
pub fn wine_flags(layer: &CompatLayer, wrapper: Option<&str>) -> Vec<String> {
    match layer.kind {
        CompatKind::Wine => {
            let mut flags = vec!["--wine".to_string(), layer.binary.display().to_string()];
            if let Some(wrapper) = wrapper.filter(|w| !w.is_empty()) {
                flags.push("--wrapper".to_string());
                flags.push(wrapper.to_string());
            }
            flags
        }
        CompatKind::Proton => {
            let prefix = wrapper.unwrap_or_default();
            let combined = format!("{prefix} \"{}\" run", layer.binary.display());
            vec![
                "--no-wine".to_string(),
                "--wrapper".to_string(),
                combined.trim_start().to_string(),
            ]
        }
    }
}

/// The wineserver binary next to a plain wine binary, when present.
///
/// Proton manages its own server processes, so only the wine kind
/// resolves.
pub fn wineserver_path(layer: &CompatLayer) -> Option<PathBuf> {
    if layer.kind != CompatKind::Wine {
        return None;
    }
    layer
        .binary
        .parent()
        .map(|dir| dir.join("wineserver"))
        .filter(|path| path.is_file())
}
