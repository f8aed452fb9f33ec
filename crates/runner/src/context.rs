//! Dependency bundle and narrow contracts for the out-of-scope services.
//!
//! The async contracts use manually boxed futures so they stay
//! object-safe; the shell implements them on top of whatever it already
//! has (session store, config files, desktop integration).

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use gamedock_launch::{GameConfig, GlobalConfig};
use gamedock_process::{AbortRegistry, GameLogRegistry};
use gamedock_progress::ProgressParser;
use gamedock_protocol::{
    FrontendMessage, FrontendSink, GameInfo, GameStatus, InstallPlatform, InstalledInfo, Runner,
};
use gamedock_registry::{InstalledStore, LibraryStore};

use crate::error::GameError;

/// An authenticated storefront session.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    pub access_token: String,
    pub user_id: String,
}

/// Session lookup for one storefront account.
pub trait CredentialsProvider: Send + Sync {
    fn credentials(&self) -> Pin<Box<dyn Future<Output = Option<Credentials>> + Send + '_>>;
}

/// Backend-authoritative metadata for an installed build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstallMetadata {
    pub version: String,
    pub build_id: String,
    pub version_etag: String,
}

/// Fetches authoritative install metadata after a successful
/// install/update, before anything is persisted.
pub trait MetadataProvider: Send + Sync {
    fn install_metadata<'a>(
        &'a self,
        app_name: &'a str,
        platform: InstallPlatform,
        branch: Option<&'a str>,
        build: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<InstallMetadata, GameError>> + Send + 'a>>;
}

/// Desktop/launcher shortcut integration. Best-effort; failures are the
/// shell's problem.
pub trait ShortcutService: Send + Sync {
    fn add<'a>(&'a self, game: &'a GameInfo) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
    fn remove<'a>(&'a self, game: &'a GameInfo) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Disk-space and size-label helpers.
pub trait DiskUsage: Send + Sync {
    fn path_disk_size<'a>(
        &'a self,
        path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = u64> + Send + 'a>>;

    /// Human-readable size label stored in the registry.
    fn format_size(&self, bytes: u64) -> String {
        const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
        let mut value = bytes as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        if unit == 0 {
            format!("{bytes} B")
        } else {
            format!("{value:.2} {}", UNITS[unit])
        }
    }
}

/// Connectivity state, plus a hook to run queued work once online.
pub trait OnlineMonitor: Send + Sync {
    fn is_online(&self) -> bool;
    fn notify_when_online(&self, callback: Box<dyn FnOnce() + Send>);
}

/// Platform-specific post-install setup (registry fixes, redistributables).
///
/// Runs only after a successful install/update/move and only best-effort;
/// its internals belong to the shell's platform integration.
pub trait SetupService: Send + Sync {
    fn setup<'a>(
        &'a self,
        app_name: &'a str,
        install: &'a InstalledInfo,
    ) -> Pin<Box<dyn Future<Output = Result<(), GameError>> + Send + 'a>>;
}

/// Access to loaded configuration. Loading/validation happens elsewhere.
pub trait ConfigProvider: Send + Sync {
    fn game_config(&self, app_name: &str, runner: Runner) -> GameConfig;
    fn global_config(&self) -> GlobalConfig;
}

/// Filesystem layout for one backend.
#[derive(Debug, Clone)]
pub struct StorePaths {
    /// The backend CLI executable.
    pub binary: PathBuf,
    /// Root for per-app installer support files.
    pub support_path: PathBuf,
    /// Root for backend manifests.
    pub manifests_path: PathBuf,
    /// Root for install/game log files.
    pub log_dir: PathBuf,
}

impl StorePaths {
    pub fn support_dir(&self, app_name: &str) -> PathBuf {
        self.support_path.join(app_name)
    }

    pub fn manifest_path(&self, app_name: &str) -> PathBuf {
        self.manifests_path.join(app_name)
    }

    /// Log file shared by install/update/repair runs for one game.
    pub fn install_log_path(&self, app_name: &str) -> PathBuf {
        self.log_dir.join(format!("{app_name}.log"))
    }

    /// Log file the game's own output is appended to while playing.
    pub fn game_log_path(&self, app_name: &str) -> PathBuf {
        self.log_dir.join(format!("{app_name}-lastPlay.log"))
    }
}

/// Everything a backend's workflows need, bundled.
#[derive(Clone)]
pub struct StoreContext {
    pub runner: Runner,
    pub paths: StorePaths,
    pub abort: Arc<AbortRegistry>,
    pub parser: Arc<ProgressParser>,
    pub sink: Arc<dyn FrontendSink>,
    pub game_logs: Arc<GameLogRegistry>,
    pub library: Arc<LibraryStore>,
    pub installed: Arc<InstalledStore>,
    pub config: Arc<dyn ConfigProvider>,
    pub credentials: Arc<dyn CredentialsProvider>,
    pub metadata: Arc<dyn MetadataProvider>,
    pub shortcuts: Arc<dyn ShortcutService>,
    pub disk: Arc<dyn DiskUsage>,
    pub online: Arc<dyn OnlineMonitor>,
    pub setup: Arc<dyn SetupService>,
}

impl StoreContext {
    /// Emits a status transition for a game.
    pub fn status_update(&self, app_name: &str, status: GameStatus) {
        self.sink.send(FrontendMessage::StatusUpdate {
            app_name: app_name.to_string(),
            runner: self.runner,
            status,
        });
    }

    /// Feeds one backend output line through the shared progress parser,
    /// emitting a progress update when a snapshot completes.
    pub fn report_progress(&self, app_name: &str, status: GameStatus, line: &str) {
        if let Some(progress) = self.parser.on_output(app_name, line) {
            tracing::info!(
                app = app_name,
                percent = progress.percent,
                eta = progress.eta.as_deref(),
                "install progress"
            );
            self.sink.send(FrontendMessage::ProgressUpdate {
                app_name: app_name.to_string(),
                runner: self.runner,
                status,
                progress,
            });
        }
    }

    /// Pushes the library's current view of a game to the shell.
    pub fn push_library_update(&self, app_name: &str) {
        if let Some(game) = self.library.get(app_name) {
            self.sink.send(FrontendMessage::LibraryPush { game });
        }
    }

    /// Shows an error dialog in the shell.
    pub fn error_dialog(&self, title: &str, message: &str) {
        self.sink.send(FrontendMessage::ShowDialog {
            title: title.to_string(),
            message: message.to_string(),
            dialog_type: gamedock_protocol::DialogType::Error,
        });
    }

    /// Fails with [`GameError::Credentials`] when no session is available.
    pub async fn require_credentials(&self) -> Result<Credentials, GameError> {
        self.credentials
            .credentials()
            .await
            .ok_or(GameError::Credentials)
    }
}
