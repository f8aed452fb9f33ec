//! Pure legendary argument construction.

use std::path::Path;

use gamedock_protocol::{InstallArgs, InstallPlatform};

/// Platforms legendary can install for. Epic ships no Linux builds.
pub const SUPPORTED_PLATFORMS: [InstallPlatform; 2] =
    [InstallPlatform::Windows, InstallPlatform::Osx];

/// legendary spells platforms with Epic's capitalization.
pub fn platform_arg(platform: InstallPlatform) -> &'static str {
    match platform {
        InstallPlatform::Windows => "Windows",
        InstallPlatform::Osx => "Mac",
        InstallPlatform::Linux => "Linux",
    }
}

/// DLC selection flags: exactly one of "skip" or "include plus id list".
pub fn dlc_args(install_dlcs: &[String]) -> Vec<String> {
    if install_dlcs.is_empty() {
        vec!["--skip-dlcs".to_string()]
    } else {
        vec![
            "--with-dlcs".to_string(),
            "--dlcs".to_string(),
            install_dlcs.join(","),
        ]
    }
}

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
    let args = params.args;
    let mut parts = vec![
        "download".to_string(),
        params.app_name.to_string(),
        "--platform".to_string(),
        platform_arg(args.platform).to_string(),
        "--path".to_string(),
        args.path.clone(),
    ];
    parts.extend(dlc_args(&args.install_dlcs));
    if !args.language.is_empty() {
        parts.push("--lang".to_string());
        parts.push(args.language.clone());
    }
    push_workers(&mut parts, params.workers);
    parts
}

pub struct UpdateParams<'a> {
    pub app_name: &'a str,
    pub platform: InstallPlatform,
    pub install_path: &'a str,
    pub dlcs: &'a [String],
    pub workers: Option<u32>,
}

pub fn update_args(params: &UpdateParams<'_>) -> Vec<String> {
    let mut parts = vec![
        "update".to_string(),
        params.app_name.to_string(),
        "--platform".to_string(),
        platform_arg(params.platform).to_string(),
        "--path".to_string(),
        params.install_path.to_string(),
    ];
    parts.extend(dlc_args(params.dlcs));
    push_workers(&mut parts, params.workers);
    parts
}

/// Repair parameters are read back from the persisted record.
pub struct RepairParams<'a> {
    pub app_name: &'a str,
    pub platform: InstallPlatform,
    pub install_path: &'a str,
    pub dlcs: &'a [String],
    pub workers: Option<u32>,
}

pub fn repair_args(params: &RepairParams<'_>) -> Vec<String> {
    let mut parts = vec![
        "repair".to_string(),
        params.app_name.to_string(),
        "--platform".to_string(),
        platform_arg(params.platform).to_string(),
        "--path".to_string(),
        params.install_path.to_string(),
    ];
    parts.extend(dlc_args(params.dlcs));
    push_workers(&mut parts, params.workers);
    parts
}

pub fn import_args(app_name: &str, folder: &Path, platform: InstallPlatform) -> Vec<String> {
    vec![
        "import".to_string(),
        app_name.to_string(),
        folder.display().to_string(),
        "--platform".to_string(),
        platform_arg(platform).to_string(),
    ]
}

pub fn uninstall_args(app_name: &str) -> Vec<String> {
    vec!["uninstall".to_string(), app_name.to_string(), "-y".to_string()]
}

pub struct LaunchParams<'a> {
    pub app_name: &'a str,
    pub exe_override: Option<&'a str>,
    pub wine_flags: &'a [String],
    pub offline: bool,
    pub user_args: &'a [String],
    pub launcher_args: &'a [String],
}

pub fn launch_args(params: &LaunchParams<'_>) -> Vec<String> {
    let mut parts = vec!["launch".to_string(), params.app_name.to_string()];
    if params.offline {
        parts.push("--offline".to_string());
    }
    if let Some(exe) = params.exe_override.filter(|e| !e.is_empty()) {
        parts.push("--override-exe".to_string());
        parts.push(exe.to_string());
    }
    parts.extend(params.wine_flags.iter().cloned());
    parts.extend(params.user_args.iter().cloned());
    parts.extend(params.launcher_args.iter().cloned());
    parts
}

pub struct SaveSyncParams<'a> {
    pub location_path: &'a str,
    pub app_name: &'a str,
    pub platform: InstallPlatform,
    pub timestamp: &'a str,
    pub name: &'a str,
    pub direction: &'a str,
}

pub fn save_sync_args(params: &SaveSyncParams<'_>) -> Vec<String> {
    vec![
        "save-sync".to_string(),
        params.location_path.to_string(),
        params.app_name.to_string(),
        "--os".to_string(),
        platform_arg(params.platform).to_string(),
        "--ts".to_string(),
        params.timestamp.to_string(),
        "--name".to_string(),
        params.name.to_string(),
        params.direction.to_string(),
    ]
}
