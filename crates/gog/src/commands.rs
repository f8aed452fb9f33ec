//! Pure gogdl argument construction.
//!
//! Every builder maps lifecycle state to an argument vector and nothing
//! else; identical inputs always yield identical vectors. The branch
//! password is appended last so log redaction stays trivial.

use std::path::Path;

use gamedock_protocol::{InstallArgs, InstallPlatform};

/// Platforms gogdl can install for.
pub const SUPPORTED_PLATFORMS: [InstallPlatform; 3] = [
    InstallPlatform::Windows,
    InstallPlatform::Osx,
    InstallPlatform::Linux,
];

const DEFAULT_LANGUAGE: &str = "en-US";

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

fn push_optional(parts: &mut Vec<String>, flag: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        parts.push(flag.to_string());
        parts.push(value.to_string());
    }
}

fn push_workers(parts: &mut Vec<String>, workers: Option<u32>) {
    if let Some(workers) = workers {
        parts.push("--max-workers".to_string());
        parts.push(workers.to_string());
    }
}

fn push_password(parts: &mut Vec<String>, password: &str) {
    if !password.is_empty() {
        parts.push("--password".to_string());
        parts.push(password.to_string());
    }
}

/// Inputs for the `download` verb.
pub struct DownloadParams<'a> {
    pub app_name: &'a str,
    pub args: &'a InstallArgs,
    pub support_dir: &'a Path,
    pub workers: Option<u32>,
    pub branch_password: &'a str,
}

pub fn download_args(params: &DownloadParams<'_>) -> Vec<String> {
    let args = params.args;
    let mut parts = vec![
        "download".to_string(),
        params.app_name.to_string(),
        "--platform".to_string(),
        args.platform.as_str().to_string(),
        "--path".to_string(),
        args.path.clone(),
        "--support".to_string(),
        params.support_dir.display().to_string(),
    ];
    parts.extend(dlc_args(&args.install_dlcs));
    parts.push("--lang".to_string());
    parts.push(if args.language.is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        args.language.clone()
    });
    push_optional(&mut parts, "--build", args.build.as_deref());
    push_optional(&mut parts, "--branch", args.branch.as_deref());
    push_workers(&mut parts, params.workers);
    push_password(&mut parts, params.branch_password);
    parts
}

/// Inputs for the `update` verb.
pub struct UpdateParams<'a> {
    pub app_name: &'a str,
    pub platform: InstallPlatform,
    pub install_path: &'a str,
    pub support_dir: &'a Path,
    pub dlcs: &'a [String],
    pub language: &'a str,
    pub build: Option<&'a str>,
    pub branch: Option<&'a str>,
    pub workers: Option<u32>,
    pub branch_password: &'a str,
}

pub fn update_args(params: &UpdateParams<'_>) -> Vec<String> {
    let mut parts = vec![
        "update".to_string(),
        params.app_name.to_string(),
        "--platform".to_string(),
        params.platform.as_str().to_string(),
        "--path".to_string(),
        params.install_path.to_string(),
        "--support".to_string(),
        params.support_dir.display().to_string(),
    ];
    parts.extend(dlc_args(params.dlcs));
    parts.push("--lang".to_string());
    parts.push(if params.language.is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        params.language.to_string()
    });
    push_workers(&mut parts, params.workers);
    push_optional(&mut parts, "--build", params.build);
    push_optional(&mut parts, "--branch", params.branch);
    push_password(&mut parts, params.branch_password);
    parts
}

/// Inputs for the `repair` verb.
///
/// Repair reconciles against known-good manifest state, so everything
/// here is read back from the persisted record, never caller-supplied.
pub struct RepairParams<'a> {
    pub app_name: &'a str,
    pub platform: InstallPlatform,
    pub install_path: &'a str,
    pub support_dir: &'a Path,
    pub dlcs: &'a [String],
    pub language: &'a str,
    pub build_id: &'a str,
    pub workers: Option<u32>,
    pub branch_password: &'a str,
}

pub fn repair_args(params: &RepairParams<'_>) -> Vec<String> {
    let mut parts = vec![
        "repair".to_string(),
        params.app_name.to_string(),
        "--platform".to_string(),
        params.platform.as_str().to_string(),
        "--path".to_string(),
        params.install_path.to_string(),
        "--support".to_string(),
        params.support_dir.display().to_string(),
    ];
    parts.extend(dlc_args(params.dlcs));
    parts.push("--lang".to_string());
    parts.push(if params.language.is_empty() {
        DEFAULT_LANGUAGE.to_string()
    } else {
        params.language.to_string()
    });
    if !params.build_id.is_empty() {
        parts.push(format!("-b={}", params.build_id));
    }
    push_workers(&mut parts, params.workers);
    push_password(&mut parts, params.branch_password);
    parts
}

/// Inputs for the `launch` verb.
pub struct LaunchParams<'a> {
    pub install_path: &'a str,
    pub app_name: &'a str,
    pub exe_override: Option<&'a str>,
    pub wine_flags: &'a [String],
    pub platform: InstallPlatform,
    pub user_args: &'a [String],
    pub launcher_args: &'a [String],
    /// Backend-specific extras appended by pre-launch steps.
    pub extra_args: &'a [String],
}

pub fn launch_args(params: &LaunchParams<'_>) -> Vec<String> {
    let mut parts = vec![
        "launch".to_string(),
        params.install_path.to_string(),
    ];
    push_optional(&mut parts, "--override-exe", params.exe_override);
    parts.push(params.app_name.to_string());
    parts.extend(params.wine_flags.iter().cloned());
    parts.push("--platform".to_string());
    parts.push(params.platform.as_str().to_string());
    parts.extend(params.extra_args.iter().cloned());
    parts.extend(params.user_args.iter().cloned());
    parts.extend(params.launcher_args.iter().cloned());
    parts
}

/// Inputs for the `save-sync` verb.
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
        params.platform.as_str().to_string(),
        "--ts".to_string(),
        params.timestamp.to_string(),
        "--name".to_string(),
        params.name.to_string(),
        params.direction.to_string(),
    ]
}

/// Inputs for the `import` verb.
pub fn import_args(folder: &Path) -> Vec<String> {
    vec!["import".to_string(), folder.display().to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn install_args(dlcs: &[&str]) -> InstallArgs {
        InstallArgs {
            path: "/games".into(),
            platform: InstallPlatform::Windows,
            install_dlcs: dlcs.iter().map(|s| s.to_string()).collect(),
            language: "en-US".into(),
            build: None,
            branch: None,
        }
    }

    fn download(params_args: &InstallArgs, workers: Option<u32>, password: &str) -> Vec<String> {
        download_args(&DownloadParams {
            app_name: "1234",
            args: params_args,
            support_dir: Path::new("/support/1234"),
            workers,
            branch_password: password,
        })
    }

    #[test]
    fn download_is_deterministic() {
        let args = install_args(&["dlc1"]);
        assert_eq!(download(&args, Some(4), "pw"), download(&args, Some(4), "pw"));
    }

    #[test]
    fn download_with_dlcs_scenario() {
        let args = install_args(&["dlc1", "dlc2"]);
        let parts = download(&args, None, "");
        let joined = parts.join(" ");
        assert!(joined.contains("--with-dlcs --dlcs dlc1,dlc2"));
        assert!(!joined.contains("--skip-dlcs"));
    }

    #[test]
    fn download_without_dlcs_skips() {
        let parts = download(&install_args(&[]), None, "");
        assert!(parts.contains(&"--skip-dlcs".to_string()));
        assert!(!parts.contains(&"--with-dlcs".to_string()));
        assert!(!parts.contains(&"--dlcs".to_string()));
    }

    #[test]
    fn dlc_flags_are_exclusive() {
        for dlcs in [vec![], vec!["a".to_string()], vec!["a".to_string(), "b".to_string()]] {
            let flags = dlc_args(&dlcs);
            let has_skip = flags.contains(&"--skip-dlcs".to_string());
            let has_with = flags.contains(&"--with-dlcs".to_string());
            assert!(has_skip != has_with, "exactly one DLC mode expected: {flags:?}");
        }
    }

    #[test]
    fn absent_overrides_emit_no_flags() {
        let parts = download(&install_args(&[]), None, "");
        assert!(!parts.contains(&"--build".to_string()));
        assert!(!parts.contains(&"--branch".to_string()));
        assert!(!parts.contains(&"--max-workers".to_string()));
        assert!(!parts.contains(&"--password".to_string()));
    }

    #[test]
    fn password_is_last() {
        let mut args = install_args(&[]);
        args.build = Some("b42".into());
        args.branch = Some("beta".into());
        let parts = download(&args, Some(8), "hunter2");

        assert_eq!(parts[parts.len() - 2], "--password");
        assert_eq!(parts[parts.len() - 1], "hunter2");
        let build_pos = parts.iter().position(|p| p == "--build").unwrap();
        let workers_pos = parts.iter().position(|p| p == "--max-workers").unwrap();
        assert!(build_pos < workers_pos);
    }

    #[test]
    fn download_verb_and_identity_lead() {
        let parts = download(&install_args(&[]), None, "");
        assert_eq!(parts[0], "download");
        assert_eq!(parts[1], "1234");
        assert_eq!(parts[2], "--platform");
        assert_eq!(parts[3], "windows");
    }

    #[test]
    fn repair_reads_back_manifest_values() {
        let parts = repair_args(&RepairParams {
            app_name: "1234",
            platform: InstallPlatform::Windows,
            install_path: "/games/Foo",
            support_dir: Path::new("/support/1234"),
            dlcs: &["dlc1".to_string()],
            language: "",
            build_id: "build-77",
            workers: None,
            branch_password: "",
        });
        assert_eq!(parts[0], "repair");
        assert!(parts.contains(&"-b=build-77".to_string()));
        // Missing language falls back rather than emitting an empty flag.
        let lang_pos = parts.iter().position(|p| p == "--lang").unwrap();
        assert_eq!(parts[lang_pos + 1], "en-US");
    }

    #[test]
    fn update_orders_workers_before_pins() {
        let parts = update_args(&UpdateParams {
            app_name: "1234",
            platform: InstallPlatform::Windows,
            install_path: "/games/Foo",
            support_dir: Path::new("/support/1234"),
            dlcs: &[],
            language: "fr-FR",
            build: Some("b2"),
            branch: Some("beta"),
            workers: Some(2),
            branch_password: "pw",
        });
        let workers_pos = parts.iter().position(|p| p == "--max-workers").unwrap();
        let build_pos = parts.iter().position(|p| p == "--build").unwrap();
        let password_pos = parts.iter().position(|p| p == "--password").unwrap();
        assert!(workers_pos < build_pos);
        assert_eq!(password_pos, parts.len() - 2);
    }

    #[test]
    fn launch_assembles_in_order() {
        let wine = vec!["--wine".to_string(), "/usr/bin/wine".to_string()];
        let parts = launch_args(&LaunchParams {
            install_path: "/games/Foo",
            app_name: "1234",
            exe_override: Some("Foo.exe"),
            wine_flags: &wine,
            platform: InstallPlatform::Windows,
            user_args: &["--windowed".to_string()],
            launcher_args: &["-skip-intro".to_string()],
            extra_args: &[],
        });
        assert_eq!(
            parts,
            vec![
                "launch",
                "/games/Foo",
                "--override-exe",
                "Foo.exe",
                "1234",
                "--wine",
                "/usr/bin/wine",
                "--platform",
                "windows",
                "--windowed",
                "-skip-intro",
            ]
        );
    }

    #[test]
    fn save_sync_shape() {
        let parts = save_sync_args(&SaveSyncParams {
            location_path: "/saves/slot",
            app_name: "1234",
            platform: InstallPlatform::Windows,
            timestamp: "1700000000",
            name: "saves",
            direction: "--skip-upload",
        });
        assert_eq!(
            parts,
            vec![
                "save-sync",
                "/saves/slot",
                "1234",
                "--os",
                "windows",
                "--ts",
                "1700000000",
                "--name",
                "saves",
                "--skip-upload",
            ]
        );
    }
}
