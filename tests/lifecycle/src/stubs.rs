//! Test doubles for the out-of-scope service contracts, plus a harness
//! that wires a full `StoreContext` over temporary stores and stub
//! backend scripts.

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gamedock_launch::{GameConfig, GlobalConfig};
use gamedock_process::{AbortRegistry, GameLogRegistry, LogConfig};
use gamedock_progress::ProgressParser;
use gamedock_protocol::{
    ChannelSink, FrontendMessage, GameInfo, InstallPlatform, InstalledInfo, Runner,
};
use gamedock_registry::{InstalledStore, LibraryStore};
use gamedock_runner::{
    ConfigProvider, Credentials, CredentialsProvider, DiskUsage, GameError, InstallMetadata,
    MetadataProvider, OnlineMonitor, SetupService, ShortcutService, StoreContext, StorePaths,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc::UnboundedReceiver;

pub struct StubCredentials(pub Option<Credentials>);

impl CredentialsProvider for StubCredentials {
    fn credentials(&self) -> Pin<Box<dyn Future<Output = Option<Credentials>> + Send + '_>> {
        let creds = self.0.clone();
        Box::pin(async move { creds })
    }
}

pub fn logged_in() -> StubCredentials {
    StubCredentials(Some(Credentials {
        access_token: "token".into(),
        user_id: "user-1".into(),
    }))
}

pub struct StubMetadata;

impl MetadataProvider for StubMetadata {
    fn install_metadata<'a>(
        &'a self,
        _app_name: &'a str,
        _platform: InstallPlatform,
        _branch: Option<&'a str>,
        _build: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<InstallMetadata, GameError>> + Send + 'a>> {
        Box::pin(async {
            Ok(InstallMetadata {
                version: "1.0".into(),
                build_id: "build-1".into(),
                version_etag: "etag-1".into(),
            })
        })
    }
}

pub struct StubShortcuts;

impl ShortcutService for StubShortcuts {
    fn add<'a>(&'a self, _game: &'a GameInfo) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }

    fn remove<'a>(&'a self, _game: &'a GameInfo) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async {})
    }
}

pub struct StubDisk;

impl DiskUsage for StubDisk {
    fn path_disk_size<'a>(
        &'a self,
        _path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = u64> + Send + 'a>> {
        Box::pin(async { 1_073_741_824 })
    }
}

pub struct StubOnline {
    online: AtomicBool,
    callbacks: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

impl StubOnline {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
            callbacks: Mutex::new(Vec::new()),
        }
    }
}

impl OnlineMonitor for StubOnline {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    fn notify_when_online(&self, callback: Box<dyn FnOnce() + Send>) {
        self.callbacks.lock().unwrap().push(callback);
    }
}

pub struct StubSetup;

impl SetupService for StubSetup {
    fn setup<'a>(
        &'a self,
        _app_name: &'a str,
        _install: &'a InstalledInfo,
    ) -> Pin<Box<dyn Future<Output = Result<(), GameError>> + Send + 'a>> {
        Box::pin(async { Ok(()) })
    }
}

pub struct StaticConfig {
    pub game: GameConfig,
    pub global: GlobalConfig,
}

impl ConfigProvider for StaticConfig {
    fn game_config(&self, _app_name: &str, _runner: Runner) -> GameConfig {
        self.game.clone()
    }

    fn global_config(&self) -> GlobalConfig {
        self.global.clone()
    }
}

/// A full context over temporary stores and a stub backend binary.
pub struct Harness {
    pub dir: tempfile::TempDir,
    pub ctx: StoreContext,
    pub events: UnboundedReceiver<FrontendMessage>,
}

impl Harness {
    pub fn new(runner: Runner, binary: PathBuf) -> Self {
        Self::with_credentials(runner, binary, logged_in())
    }

    pub fn with_credentials(
        runner: Runner,
        binary: PathBuf,
        credentials: StubCredentials,
    ) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        std::fs::create_dir_all(&log_dir).unwrap();

        let (sink, events) = ChannelSink::new();
        let ctx = StoreContext {
            runner,
            paths: StorePaths {
                binary,
                support_path: dir.path().join("support"),
                manifests_path: dir.path().join("manifests"),
                log_dir,
            },
            abort: Arc::new(AbortRegistry::new()),
            parser: Arc::new(ProgressParser::new()),
            sink: Arc::new(sink),
            game_logs: Arc::new(GameLogRegistry::new(
                Arc::new(LogConfig::new(false)),
                Duration::from_millis(50),
            )),
            library: Arc::new(LibraryStore::load(dir.path().join("library.json")).unwrap()),
            installed: Arc::new(InstalledStore::load(dir.path().join("installed.json")).unwrap()),
            config: Arc::new(StaticConfig {
                game: GameConfig::default(),
                global: GlobalConfig::default(),
            }),
            credentials: Arc::new(credentials),
            metadata: Arc::new(StubMetadata),
            shortcuts: Arc::new(StubShortcuts),
            disk: Arc::new(StubDisk),
            online: Arc::new(StubOnline::new(true)),
            setup: Arc::new(StubSetup),
        };

        Self { dir, ctx, events }
    }

    pub fn seed_game(&self, app_name: &str, folder_name: &str) {
        self.ctx
            .library
            .upsert(GameInfo {
                app_name: app_name.into(),
                runner: self.ctx.runner,
                title: format!("Game {app_name}"),
                art_cover: String::new(),
                art_square: String::new(),
                folder_name: folder_name.into(),
                is_installed: false,
                install: None,
                can_run_offline: true,
            })
            .unwrap();
    }

    pub fn seed_installed(&self, app_name: &str, install_path: &Path, platform: InstallPlatform) {
        self.ctx
            .installed
            .insert(InstalledInfo {
                app_name: app_name.into(),
                platform,
                executable: String::new(),
                install_path: install_path.display().to_string(),
                install_size: "1.00 GiB".into(),
                version: "1.0".into(),
                build_id: "build-0".into(),
                version_etag: "etag-0".into(),
                branch: None,
                language: "en-US".into(),
                installed_dlcs: vec![],
                pinned_version: false,
            })
            .unwrap();
        self.ctx
            .library
            .refresh_installed(&self.ctx.installed)
            .unwrap();
    }

    /// Drains currently buffered frontend messages.
    pub fn drain_events(&mut self) -> Vec<FrontendMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = self.events.try_recv() {
            messages.push(message);
        }
        messages
    }
}

/// Writes an executable `sh` script acting as a stub backend binary.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
    path
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Minimal loopback HTTP server answering every request with one canned
/// response. Returns the base URL and a hit counter.
pub async fn spawn_http_server(status: &'static str, body: &'static str) -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                let header_end = loop {
                    match socket.read(&mut chunk).await {
                        Ok(0) => return,
                        Ok(n) => {
                            buf.extend_from_slice(&chunk[..n]);
                            if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
                                break pos + 4;
                            }
                        }
                        Err(_) => return,
                    }
                };

                let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                while buf.len() < header_end + content_length {
                    match socket.read(&mut chunk).await {
                        Ok(0) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        Err(_) => break,
                    }
                }

                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), hits)
}
