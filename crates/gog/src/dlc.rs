//! Per-item DLC uninstaller discovery.
//!
//! GOG installers drop numbered `unins###.ini`/`unins###.exe` pairs in the
//! game directory, one per installed product. Updating with a reduced DLC
//! set runs the matching uninstallers before the main update command.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static UNINSTALLER_INI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^unins\d{3}\.ini$").unwrap());

/// One uninstaller matched to a removed product.
#[derive(Debug, Clone, PartialEq)]
pub struct DlcUninstaller {
    pub executable: PathBuf,
    pub product_id: String,
}

/// Scans the install directory for uninstallers of the given products.
pub fn find_dlc_uninstallers(
    install_path: &Path,
    removed: &[String],
) -> std::io::Result<Vec<DlcUninstaller>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(install_path)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !UNINSTALLER_INI.is_match(name) {
            continue;
        }

        let contents = match std::fs::read_to_string(entry.path()) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(file = name, error = %e, "failed to read uninstaller descriptor");
                continue;
            }
        };

        let Some(product_id) = parse_product_id(&contents) else {
            continue;
        };
        if removed.contains(&product_id) {
            found.push(DlcUninstaller {
                executable: install_path.join(name.replace(".ini", ".exe")),
                product_id,
            });
        }
    }
    Ok(found)
}

/// Extracts `productID` from the `[InstallSettings]` section.
fn parse_product_id(contents: &str) -> Option<String> {
    let mut in_install_settings = false;
    for line in contents.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_install_settings = line.eq_ignore_ascii_case("[InstallSettings]");
            continue;
        }
        if !in_install_settings {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            if key.trim().eq_ignore_ascii_case("productID") {
                return Some(value.trim().to_string());
            }
        }
    }
    None
}

/// Flags passed to a product uninstaller.
pub fn uninstall_dlc_args(product_id: &str) -> Vec<String> {
    vec![
        format!("/ProductId={product_id}"),
        "/VERYSILENT".to_string(),
        "/galaxyclient".to_string(),
        "/KEEPSAVES".to_string(),
    ]
}
