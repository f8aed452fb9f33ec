//! Pure nile argument construction.
//!
//! Amazon has no DLC surface, so no builder here ever emits a DLC flag.

use std::path::Path;

use gamedock_protocol::{InstallArgs, InstallPlatform};

/// Amazon ships Windows builds only.
pub const SUPPORTED_PLATFORMS: [InstallPlatform; 1] = [InstallPlatform::Windows];

fn push_workers(parts: &mut Vec<String>, workers: Option<u32>) {
    if let Some(workers) = workers {
        parts.push("--max-workers".to_string());
        parts.push(workers.to_string());
    }
}

pub struct DownloadParams<'a> {
    pub app_name: &'a str,
    pub args: &'a InstallArgs,
    pub workers: Option<u32>,
}

pub fn download_args(params: &DownloadParams<'_>) -> Vec<String> {
    let mut parts = vec![
        "download".to_string(),
        params.app_name.to_string(),
        "--platform".to_string(),
        params.args.platform.as_str().to_string(),
        "--path".to_string(),
        params.args.path.clone(),
    ];
    push_workers(&mut parts, params.workers);
    parts
}

pub struct UpdateParams<'a> {
    pub app_name: &'a str,
    pub install_path: &'a str,
    pub workers: Option<u32>,
}

pub fn update_args(params: &UpdateParams<'_>) -> Vec<String> {
    let mut parts = vec![
        "update".to_string(),
        params.app_name.to_string(),
        "--path".to_string(),
        params.install_path.to_string(),
    ];
    push_workers(&mut parts, params.workers);
    parts
}

/// Repair parameters are read back from the persisted record.
pub struct RepairParams<'a> {
    pub app_name: &'a str,
    pub install_path: &'a str,
    pub workers: Option<u32>,
}

pub fn repair_args(params: &RepairParams<'_>) -> Vec<String> {
    let mut parts = vec![
        "repair".to_string(),
        params.app_name.to_string(),
        "--path".to_string(),
        params.install_path.to_string(),
    ];
    push_workers(&mut parts, params.workers);
    parts
}

pub fn import_args(app_name: &str, folder: &Path) -> Vec<String> {
    vec![
        "import".to_string(),
        app_name.to_string(),
        folder.display().to_string(),
    ]
}

pub struct LaunchParams<'a> {
    pub app_name: &'a str,
    pub wine_flags: &'a [String],
    pub user_args: &'a [String],
    pub launcher_args: &'a [String],
}

pub fn launch_args(params: &LaunchParams<'_>) -> Vec<String> {
    let mut parts = vec!["launch".to_string(), params.app_name.to_string()];
    parts.extend(params.wine_flags.iter().cloned());
    parts.extend(params.user_args.iter().cloned());
    parts.extend(params.launcher_args.iter().cloned());
    parts
}
