//! GOG lifecycle workflows.
//!
//! Each operation builds its gogdl command, runs it under the shared
//! supervisor, and persists installed state only after the process stage
//! has fully completed. Pre-flight failures (credentials, validation)
//! surface before anything spawns; an abort is a user decision, not an
//! error.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use gamedock_launch::{
    CompatKind, GameConfig, format_launch_command, join_wrappers, merge_env_layers,
    prepare_compat_launch, prepare_launch, setup_wrappers, wine_flags, wineserver_path,
    wrapper_env_vars,
};
use gamedock_playtime::{PlaytimeClient, PlaytimeQueue, PlaytimeSession};
use gamedock_process::{CommandOptions, run_command};
use gamedock_protocol::{
    ExecResult, GameInfo, GameStatus, HostPlatform, InstallArgs, InstallPlatform, InstalledInfo,
    Runner, SaveLocation, UpdateOverrides,
};
use gamedock_registry::KeyedStore;
use gamedock_runner::{
    CredentialsProvider, GameError, GameManager, InstallResult, OnlineMonitor, RemoveArgs,
    StoreContext, cleanup,
};
use serde::Deserialize;

use crate::commands::{
    self, DownloadParams, LaunchParams, RepairParams, SaveSyncParams, UpdateParams,
};
use crate::dlc;
use crate::mods::{self, ModConfig};

/// GOG playtime service.
pub const PLAYTIME_BASE_URL: &str = "https://gameplay.gog.com";

const DEFAULT_LANGUAGE: &str = "en-US";

/// Payload of a successful `import` run.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ImportOutput {
    build_id: String,
    version: String,
    platform: Option<InstallPlatform>,
}

/// The GOG backend.
pub struct GogGames {
    ctx: StoreContext,
    branch_passwords: KeyedStore<String>,
    sync_cursors: KeyedStore<HashMap<String, String>>,
    mods: KeyedStore<ModConfig>,
    playtime: Arc<PlaytimeClient>,
    playtime_queue: Arc<PlaytimeQueue>,
}

impl GogGames {
    pub fn new(ctx: StoreContext, store_dir: &Path) -> Result<Self, GameError> {
        Self::with_playtime_base_url(ctx, store_dir, PLAYTIME_BASE_URL)
    }

    /// Constructor with an overridable playtime endpoint (used by tests).
    pub fn with_playtime_base_url(
        ctx: StoreContext,
        store_dir: &Path,
        playtime_base_url: &str,
    ) -> Result<Self, GameError> {
        Ok(Self {
            branch_passwords: KeyedStore::load(store_dir.join("branch-passwords.json"))?,
            sync_cursors: KeyedStore::load(store_dir.join("save-sync-cursors.json"))?,
            mods: KeyedStore::load(store_dir.join("mod-config.json"))?,
            playtime: Arc::new(PlaytimeClient::new(playtime_base_url)),
            playtime_queue: Arc::new(
                PlaytimeQueue::load(store_dir.join("playtime-queue.json"))
                    .map_err(playtime_load_error)?,
            ),
            ctx,
        })
    }

    pub fn branch_password(&self, app_name: &str) -> String {
        self.branch_passwords.get_or(app_name, String::new())
    }

    pub fn set_branch_password(&self, app_name: &str, password: &str) -> Result<(), GameError> {
        self.branch_passwords
            .set(app_name, password.to_string())
            .map_err(GameError::from)
    }

    /// Per-game mod configuration.
    pub fn mod_config(&self, app_name: &str) -> ModConfig {
        self.mods.get_or(app_name, ModConfig::default())
    }

    pub fn set_mod_config(&self, app_name: &str, config: ModConfig) -> Result<(), GameError> {
        self.mods.set(app_name, config).map_err(GameError::from)
    }

    /// Removes the registry entry without touching the filesystem.
    pub fn force_uninstall(&self, app_name: &str) -> Result<(), GameError> {
        self.ctx.installed.remove(app_name)?;
        self.ctx.library.refresh_installed(&self.ctx.installed)?;
        self.ctx.push_library_update(app_name);
        Ok(())
    }

    /// Aggregate playtime for a game, in minutes.
    pub async fn playtime(&self, app_name: &str) -> Option<u64> {
        if !self.ctx.online.is_online() {
            return None;
        }
        let creds = self.ctx.credentials.credentials().await?;
        match self
            .playtime
            .playtime(app_name, &creds.user_id, &creds.access_token)
            .await
        {
            Ok(minutes) => Some(minutes),
            Err(e) => {
                tracing::warn!(app = app_name, error = %e, "failed to fetch playtime");
                None
            }
        }
    }

    /// Drains the offline playtime queue once.
    pub async fn sync_queued_playtime(&self) {
        drain_playtime_queue(
            Arc::clone(&self.playtime_queue),
            Arc::clone(&self.playtime),
            Arc::clone(&self.ctx.credentials),
            Arc::clone(&self.ctx.online),
        )
        .await;
    }

    async fn record_playtime(&self, app_name: &str, started: DateTime<Utc>, finished: DateTime<Utc>) {
        let Some(session) = PlaytimeSession::from_range(app_name, started, finished) else {
            return;
        };
        let Some(creds) = self.ctx.credentials.credentials().await else {
            tracing::warn!(app = app_name, "no credentials, unable to record play session");
            return;
        };

        if !self.ctx.online.is_online() {
            tracing::warn!(app = app_name, "offline, queuing play session");
            if let Err(e) = self.playtime_queue.enqueue(&creds.user_id, session) {
                tracing::error!(error = %e, "failed to queue play session");
            }
            self.schedule_queue_drain();
            return;
        }

        if let Err(e) = self
            .playtime
            .post_session(&creds.user_id, &creds.access_token, &session)
            .await
        {
            tracing::debug!(app = app_name, error = %e, "failed to post session, queuing");
            if let Err(e) = self.playtime_queue.enqueue(&creds.user_id, session) {
                tracing::error!(error = %e, "failed to queue play session");
            }
        }
    }

    /// Registers a one-shot drain for when connectivity returns.
    fn schedule_queue_drain(&self) {
        let queue = Arc::clone(&self.playtime_queue);
        let client = Arc::clone(&self.playtime);
        let credentials = Arc::clone(&self.ctx.credentials);
        let online = Arc::clone(&self.ctx.online);
        self.ctx.online.notify_when_online(Box::new(move || {
            tokio::spawn(drain_playtime_queue(queue, client, credentials, online));
        }));
    }

    /// Runs a Windows program through the configured compat layer.
    async fn run_compat_command(
        &self,
        app_name: &str,
        config: &GameConfig,
        command: Vec<String>,
        purpose: &str,
    ) -> Result<ExecResult, GameError> {
        let compat = prepare_compat_launch(config)?;
        let mut args = Vec::new();
        if compat.layer.kind == CompatKind::Proton {
            args.push("run".to_string());
        }
        args.extend(command);

        let opts = CommandOptions::new(format!("{app_name}-{purpose}"))
            .with_env(compat.env.clone())
            .with_log_prefix(format!("Running {purpose} command for {app_name}"));
        Ok(run_command(self.ctx.abort.as_ref(), &compat.layer.binary, &args, opts).await?)
    }

    /// Runs the per-item uninstallers for DLCs dropped from the install.
    async fn reconcile_removed_dlcs(
        &self,
        app_name: &str,
        record: &InstalledInfo,
        target_dlcs: &[String],
        config: &GameConfig,
    ) {
        let removed: Vec<String> = record
            .installed_dlcs
            .iter()
            .filter(|dlc| !target_dlcs.contains(dlc))
            .cloned()
            .collect();
        if removed.is_empty() || record.platform != InstallPlatform::Windows {
            return;
        }

        let host = HostPlatform::current();
        if host != HostPlatform::Windows && !Path::new(&config.wine_prefix).exists() {
            return;
        }

        let uninstallers =
            match dlc::find_dlc_uninstallers(Path::new(&record.install_path), &removed) {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(app = app_name, error = %e, "DLC uninstaller scan failed");
                    return;
                }
            };

        for uninstaller in uninstallers {
            tracing::info!(
                app = app_name,
                product = %uninstaller.product_id,
                "uninstalling removed DLC"
            );
            let result = if host == HostPlatform::Windows {
                let flags = dlc::uninstall_dlc_args(&uninstaller.product_id);
                run_command(
                    self.ctx.abort.as_ref(),
                    &uninstaller.executable,
                    &flags,
                    CommandOptions::new(format!("{app_name}-dlc-{}", uninstaller.product_id)),
                )
                .await
                .map_err(GameError::from)
            } else {
                let mut command = vec![uninstaller.executable.display().to_string()];
                command.extend(dlc::uninstall_dlc_args(&uninstaller.product_id));
                self.run_compat_command(app_name, config, command, "dlc-uninstall")
                    .await
            };
            if let Err(e) = result {
                tracing::warn!(app = app_name, error = %e, "DLC uninstaller failed");
            }
        }
    }

    /// Pre-launch mod deployment.
    ///
    /// Returns extra launch arguments on success, an empty set when the
    /// step was skipped or failed non-structurally, and an error only for
    /// a structural deploy failure (which must abort the launch).
    async fn deploy_mods(
        &self,
        app_name: &str,
        install: &InstalledInfo,
        config: &GameConfig,
        mod_config: &ModConfig,
    ) -> Result<Vec<String>, GameError> {
        let install_path = Path::new(&install.install_path);
        let tool_dir = mods::deploy_tool_dir(install_path);
        if !tool_dir.exists() {
            tracing::error!(app = app_name, "unable to deploy mods, tool missing");
            return Ok(Vec::new());
        }

        let available = mods::available_mods(install_path);
        let mut to_load: Vec<String> = mod_config
            .mods_to_load
            .iter()
            .filter(|name| available.contains(name))
            .cloned()
            .collect();
        if to_load.is_empty() && !available.is_empty() {
            tracing::warn!(app = app_name, "no mods selected, loading all in order");
            to_load = available;
        }

        let tool = tool_dir.join(mods::MOD_DEPLOY_TOOL);
        let deploy = mods::deploy_args(&install.install_path, &to_load);
        let result = if HostPlatform::current() == HostPlatform::Windows {
            run_command(
                self.ctx.abort.as_ref(),
                &tool,
                &deploy,
                CommandOptions::new(format!("{app_name}-mods")),
            )
            .await
            .map_err(GameError::from)
        } else {
            let mut command = vec![tool.display().to_string()];
            command.extend(deploy);
            self.run_compat_command(app_name, config, command, "mods").await
        };

        let res = match result {
            Ok(res) => res,
            Err(e) => {
                tracing::error!(app = app_name, error = %e, "mod deploy did not run");
                return Ok(Vec::new());
            }
        };

        self.ctx.game_logs.append(
            app_name,
            &format!("Mods deploy log:\n{}\n{}", res.stdout, res.stderr),
        );

        if mods::deploy_failed(&res.stdout) || mods::deploy_failed(&res.stderr) {
            return Err(GameError::Process("mod deploy failed".to_string()));
        }

        // A clean deploy lets the backend pick the modded launch task.
        Ok(vec!["--prefer-task".to_string(), "0".to_string()])
    }

    fn host_or_prefix_ready(&self, config: &GameConfig) -> bool {
        HostPlatform::current() == HostPlatform::Windows
            || Path::new(&config.wine_prefix).exists()
    }

    async fn run_post_install_setup(&self, app_name: &str, install: &InstalledInfo) {
        if install.platform != InstallPlatform::Windows {
            return;
        }
        let config = self.ctx.config.game_config(app_name, Runner::Gog);
        if !self.host_or_prefix_ready(&config) {
            return;
        }
        if let Err(e) = self.ctx.setup.setup(app_name, install).await {
            tracing::warn!(app = app_name, error = %e, "post-install setup failed");
        }
    }
}

impl GameManager for GogGames {
    fn runner(&self) -> Runner {
        Runner::Gog
    }

    fn game_info(&self, app_name: &str) -> Option<GameInfo> {
        self.ctx.library.get(app_name)
    }

    fn is_native(&self, app_name: &str) -> bool {
        let host = HostPlatform::current();
        if host == HostPlatform::Windows {
            return true;
        }
        match self.ctx.installed.get(app_name) {
            Some(info) => info.platform.is_native_on(host),
            None => false,
        }
    }

    fn on_install_or_update_output(&self, app_name: &str, status: GameStatus, line: &str) {
        self.ctx.report_progress(app_name, status, line);
    }

    async fn is_game_available(&self, app_name: &str) -> bool {
        match self.ctx.installed.get(app_name) {
            Some(info) => info.path_exists(),
            None => false,
        }
    }

    async fn import(
        &self,
        app_name: &str,
        path: &Path,
        platform: InstallPlatform,
    ) -> Result<ExecResult, GameError> {
        let parts = commands::import_args(path);
        let res = run_command(
            self.ctx.abort.as_ref(),
            &self.ctx.paths.binary,
            &parts,
            CommandOptions::new(app_name).with_log_prefix(format!("Importing {app_name}")),
        )
        .await?;

        if res.abort {
            return Ok(res);
        }
        if let Some(err) = &res.error {
            tracing::error!(app = app_name, error = %err, "failed to import");
            return Ok(res);
        }

        match serde_json::from_str::<ImportOutput>(&res.stdout) {
            Ok(output) => {
                let install_path = path.display().to_string();
                let size = self.ctx.disk.path_disk_size(path).await;
                let installed = InstalledInfo {
                    app_name: app_name.to_string(),
                    platform: output.platform.unwrap_or(platform),
                    executable: String::new(),
                    install_path,
                    install_size: self.ctx.disk.format_size(size),
                    version: output.version,
                    build_id: output.build_id,
                    version_etag: String::new(),
                    branch: None,
                    language: String::new(),
                    installed_dlcs: Vec::new(),
                    pinned_version: false,
                };
                self.ctx.installed.insert(installed)?;
                self.ctx.library.refresh_installed(&self.ctx.installed)?;
                if let Some(game) = self.ctx.library.get(app_name) {
                    self.ctx.shortcuts.add(&game).await;
                }
                self.ctx.push_library_update(app_name);
            }
            Err(e) => {
                tracing::error!(app = app_name, error = %e, "failed to parse import output");
            }
        }

        Ok(res)
    }

    async fn install(&self, app_name: &str, args: &InstallArgs) -> Result<InstallResult, GameError> {
        args.validate(&commands::SUPPORTED_PLATFORMS)?;
        self.ctx.require_credentials().await?;

        let global = self.ctx.config.global_config();
        let parts = commands::download_args(&DownloadParams {
            app_name,
            args,
            support_dir: &self.ctx.paths.support_dir(app_name),
            workers: global.max_download_workers,
            branch_password: &self.branch_password(app_name),
        });

        let opts = CommandOptions::new(app_name)
            .with_log_file(self.ctx.paths.install_log_path(app_name))
            .with_log_prefix(format!("Installing {app_name}"))
            .on_output(|line| {
                self.ctx
                    .report_progress(app_name, GameStatus::Installing, line)
            });
        let res = run_command(self.ctx.abort.as_ref(), &self.ctx.paths.binary, &parts, opts).await?;

        if res.abort {
            return Ok(InstallResult::aborted());
        }
        if let Some(err) = res.error {
            tracing::error!(app = app_name, error = %err, "failed to install");
            return Ok(InstallResult::failed(err));
        }

        // Install succeeded; read authoritative metadata before persisting.
        let metadata = match self
            .ctx
            .metadata
            .install_metadata(
                app_name,
                args.platform,
                args.branch.as_deref(),
                args.build.as_deref(),
            )
            .await
        {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::error!(app = app_name, error = %e, "install metadata unavailable");
                return Ok(InstallResult::failed(format!(
                    "install metadata unavailable: {e}"
                )));
            }
        };

        let Some(game) = self.ctx.library.get(app_name) else {
            tracing::error!(app = app_name, "game missing from library after install");
            return Ok(InstallResult::failed("game not present in library"));
        };
        if game.folder_name.is_empty() {
            tracing::error!(app = app_name, "library entry has no folder name");
            return Ok(InstallResult::failed("library entry has no folder name"));
        }

        let install_path = Path::new(&args.path).join(&game.folder_name);
        let size = self.ctx.disk.path_disk_size(&install_path).await;
        let installed = InstalledInfo {
            app_name: app_name.to_string(),
            platform: args.platform,
            executable: String::new(),
            install_path: install_path.display().to_string(),
            install_size: self.ctx.disk.format_size(size),
            version: metadata.version,
            build_id: metadata.build_id,
            version_etag: metadata.version_etag,
            branch: args.branch.clone(),
            language: if args.language.is_empty() {
                DEFAULT_LANGUAGE.to_string()
            } else {
                args.language.clone()
            },
            installed_dlcs: args.install_dlcs.clone(),
            pinned_version: args.build.is_some(),
        };
        self.ctx.installed.insert(installed.clone())?;
        self.ctx.library.refresh_installed(&self.ctx.installed)?;

        self.run_post_install_setup(app_name, &installed).await;
        if let Some(game) = self.ctx.library.get(app_name) {
            self.ctx.shortcuts.add(&game).await;
        }
        self.ctx.push_library_update(app_name);
        Ok(InstallResult::done())
    }

    async fn update(
        &self,
        app_name: &str,
        overrides: Option<&UpdateOverrides>,
    ) -> Result<InstallResult, GameError> {
        let record = self
            .ctx
            .installed
            .get(app_name)
            .ok_or_else(|| GameError::NotInstalled(app_name.to_string()))?;
        self.ctx.require_credentials().await?;

        let config = self.ctx.config.game_config(app_name, Runner::Gog);

        // Reconcile DLC removal through the per-item uninstallers before
        // the main update command runs.
        if let Some(target) = overrides.and_then(|o| o.dlcs.as_deref()) {
            self.reconcile_removed_dlcs(app_name, &record, target, &config)
                .await;
        }

        let language = overrides
            .and_then(|o| o.language.clone())
            .or_else(|| {
                (!record.language.is_empty()).then(|| record.language.clone())
            })
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        let dlcs = overrides
            .and_then(|o| o.dlcs.clone())
            .unwrap_or_else(|| record.installed_dlcs.clone());
        let build = overrides.and_then(|o| o.build.clone());
        let branch = overrides
            .and_then(|o| o.branch.clone())
            .or_else(|| record.branch.clone());

        let global = self.ctx.config.global_config();
        let parts = commands::update_args(&UpdateParams {
            app_name,
            platform: record.platform,
            install_path: &record.install_path,
            support_dir: &self.ctx.paths.support_dir(app_name),
            dlcs: &dlcs,
            language: &language,
            build: build.as_deref(),
            branch: branch.as_deref(),
            workers: global.max_download_workers,
            branch_password: &self.branch_password(app_name),
        });

        let opts = CommandOptions::new(app_name)
            .with_log_file(self.ctx.paths.install_log_path(app_name))
            .with_log_prefix(format!("Updating {app_name}"))
            .on_output(|line| {
                self.ctx
                    .report_progress(app_name, GameStatus::Updating, line)
            });
        let res = run_command(self.ctx.abort.as_ref(), &self.ctx.paths.binary, &parts, opts).await?;

        if res.abort {
            // A user abort mid-update is not a failure; stored state still
            // describes the previous build.
            return Ok(InstallResult::done());
        }
        if let Some(err) = res.error {
            tracing::error!(app = app_name, error = %err, "failed to update");
            self.ctx.status_update(app_name, GameStatus::Done);
            return Ok(InstallResult::failed(err));
        }

        let metadata = match self
            .ctx
            .metadata
            .install_metadata(app_name, record.platform, branch.as_deref(), build.as_deref())
            .await
        {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::error!(app = app_name, error = %e, "update metadata unavailable");
                self.ctx.status_update(app_name, GameStatus::Done);
                return Ok(InstallResult::failed(format!(
                    "update metadata unavailable: {e}"
                )));
            }
        };

        let size = self
            .ctx
            .disk
            .path_disk_size(Path::new(&record.install_path))
            .await;
        let size_label = self.ctx.disk.format_size(size);
        self.ctx.installed.update(app_name, |info| {
            info.version = metadata.version.clone();
            info.build_id = metadata.build_id.clone();
            info.version_etag = metadata.version_etag.clone();
            info.branch = branch.clone();
            info.language = language.clone();
            info.installed_dlcs = dlcs.clone();
            info.install_size = size_label.clone();
        })?;
        self.ctx.library.refresh_installed(&self.ctx.installed)?;

        if let Some(updated) = self.ctx.installed.get(app_name) {
            self.run_post_install_setup(app_name, &updated).await;
        }
        self.ctx.status_update(app_name, GameStatus::Done);
        self.ctx.push_library_update(app_name);
        Ok(InstallResult::done())
    }

    async fn repair(&self, app_name: &str) -> Result<ExecResult, GameError> {
        let record = self
            .ctx
            .installed
            .get(app_name)
            .ok_or_else(|| GameError::NotInstalled(app_name.to_string()))?;
        self.ctx.require_credentials().await?;

        // Repair reconciles against the persisted manifest; everything
        // below is read back from the record, not caller-supplied.
        let global = self.ctx.config.global_config();
        let parts = commands::repair_args(&RepairParams {
            app_name,
            platform: record.platform,
            install_path: &record.install_path,
            support_dir: &self.ctx.paths.support_dir(app_name),
            dlcs: &record.installed_dlcs,
            language: &record.language,
            build_id: &record.build_id,
            workers: global.max_download_workers,
            branch_password: &self.branch_password(app_name),
        });

        let opts = CommandOptions::new(app_name)
            .with_log_file(self.ctx.paths.install_log_path(app_name))
            .with_log_prefix(format!("Repairing {app_name}"));
        let res = run_command(self.ctx.abort.as_ref(), &self.ctx.paths.binary, &parts, opts).await?;

        if let Some(err) = &res.error {
            tracing::error!(app = app_name, error = %err, "failed to repair");
        }
        Ok(res)
    }

    async fn uninstall(&self, args: &RemoveArgs) -> Result<ExecResult, GameError> {
        let app_name = args.app_name.as_str();
        // A missing record is fatal, never a silent no-op.
        let record = self
            .ctx
            .installed
            .get(app_name)
            .ok_or_else(|| GameError::NotInstalled(app_name.to_string()))?;

        tracing::info!(app = app_name, path = %record.install_path, "removing game");
        let install_path = Path::new(&record.install_path);

        // Backend-native uninstaller first, synchronously, best-effort.
        let uninstaller = install_path.join("unins000.exe");
        if uninstaller.exists() {
            let config = self.ctx.config.game_config(app_name, Runner::Gog);
            let mut command = vec![uninstaller.display().to_string()];
            command.extend(dlc::uninstall_dlc_args(app_name));

            let result = if HostPlatform::current() == HostPlatform::Windows {
                let flags = &command[1..];
                run_command(
                    self.ctx.abort.as_ref(),
                    &uninstaller,
                    flags,
                    CommandOptions::new(format!("{app_name}-uninstall")),
                )
                .await
                .map_err(GameError::from)
            } else if Path::new(&config.wine_prefix).exists() && !args.remove_prefix {
                self.run_compat_command(app_name, &config, command, "uninstall")
                    .await
            } else {
                Ok(ExecResult::default())
            };
            if let Err(e) = result {
                tracing::warn!(app = app_name, error = %e, "native uninstaller failed");
            }
        }

        // Best-effort cleanup; missing paths count as already cleaned.
        // Only after cleanup does the registry entry go away, so a crash
        // here leaves "was installed" visible and the uninstall retryable.
        cleanup::remove_dir_best_effort(install_path);
        cleanup::remove_file_best_effort(&self.ctx.paths.manifest_path(app_name));
        cleanup::remove_dir_best_effort(&self.ctx.paths.support_dir(app_name));

        self.ctx.installed.remove(app_name)?;
        self.ctx.library.refresh_installed(&self.ctx.installed)?;
        if let Err(e) = self.sync_cursors.remove(app_name) {
            tracing::warn!(app = app_name, error = %e, "failed to drop save-sync cursors");
        }
        if let Some(game) = self.ctx.library.get(app_name) {
            self.ctx.shortcuts.remove(&game).await;
        }
        self.ctx.push_library_update(app_name);
        Ok(ExecResult::default())
    }

    async fn move_install(
        &self,
        app_name: &str,
        new_base: &Path,
    ) -> Result<InstallResult, GameError> {
        let record = self
            .ctx
            .installed
            .get(app_name)
            .ok_or_else(|| GameError::NotInstalled(app_name.to_string()))?;

        let source = Path::new(&record.install_path);
        let Some(folder) = source.file_name() else {
            return Err(GameError::Filesystem(format!(
                "install path has no final component: {}",
                record.install_path
            )));
        };
        let destination = new_base.join(folder);
        tracing::info!(app = app_name, to = %destination.display(), "moving install");

        // Files first; a failed move leaves the record untouched.
        if let Err(e) = gamedock_runner::moves::move_game_directory(source, &destination) {
            tracing::error!(app = app_name, error = %e, "failed to move install");
            return Ok(InstallResult::failed(e.to_string()));
        }

        self.ctx.installed.update(app_name, |info| {
            info.install_path = destination.display().to_string();
        })?;
        self.ctx.library.refresh_installed(&self.ctx.installed)?;

        if let Some(updated) = self.ctx.installed.get(app_name) {
            self.run_post_install_setup(app_name, &updated).await;
        }
        self.ctx.push_library_update(app_name);
        Ok(InstallResult::done())
    }

    async fn launch(&self, app_name: &str, launch_args: &[String]) -> Result<bool, GameError> {
        let config = self.ctx.config.game_config(app_name, Runner::Gog);
        let game = self
            .ctx
            .library
            .get(app_name)
            .ok_or_else(|| GameError::NotInstalled(app_name.to_string()))?;
        let Some(install) = game.install.clone() else {
            return Err(GameError::NotInstalled(app_name.to_string()));
        };

        if !install.path_exists() {
            self.ctx.error_dialog(
                "Launch aborted",
                &format!("{} appears to be deleted", game.title),
            );
            return Err(GameError::AppearsDeleted(install.install_path.clone()));
        }

        self.ctx
            .game_logs
            .open(app_name, self.ctx.paths.game_log_path(app_name));

        let native = self.is_native(app_name);
        let prep = match prepare_launch(&config, native) {
            Ok(prep) => prep,
            Err(e) => {
                self.ctx
                    .game_logs
                    .append(app_name, &format!("Launch aborted: {e}"));
                self.ctx.error_dialog("Launch aborted", &e.to_string());
                self.ctx.game_logs.close(app_name);
                return Ok(false);
            }
        };

        let wrappers = setup_wrappers(&config, &prep);
        let wrapper_str = join_wrappers(&wrappers);

        let wrapper_vars = wrapper_env_vars(app_name, Runner::Gog);
        let mut compat_vars = HashMap::new();
        let mut wine_flag: Vec<String> = if wrappers.is_empty() {
            Vec::new()
        } else {
            vec!["--wrapper".to_string(), wrapper_str.clone()]
        };

        if !native {
            let compat = match prepare_compat_launch(&config) {
                Ok(compat) => compat,
                Err(e) => {
                    self.ctx
                        .game_logs
                        .append(app_name, &format!("Launch aborted: {e}"));
                    self.ctx.error_dialog("Launch aborted", &e.to_string());
                    self.ctx.game_logs.close(app_name);
                    return Ok(false);
                }
            };
            compat_vars = compat.env.clone();
            wine_flag = wine_flags(&compat.layer, Some(&wrapper_str));
        }

        let env = merge_env_layers(&[&wrapper_vars, &compat_vars, &config.env]);

        let mod_config = self.mod_config(app_name);
        let extra_args = if mod_config.enabled {
            match self
                .deploy_mods(app_name, &install, &config, &mod_config)
                .await
            {
                Ok(extra) => extra,
                Err(e) => {
                    self.ctx
                        .error_dialog("Mod deploy failed", &format!("{e}; see the game log"));
                    self.ctx.game_logs.close(app_name);
                    return Ok(false);
                }
            }
        } else {
            Vec::new()
        };

        let parts = commands::launch_args(&LaunchParams {
            install_path: &install.install_path,
            app_name,
            exe_override: config.target_exe.as_deref(),
            wine_flags: &wine_flag,
            platform: install.platform,
            user_args: launch_args,
            launcher_args: &config.launcher_args,
            extra_args: &extra_args,
        });

        self.ctx.game_logs.append(
            app_name,
            &format!(
                "Launch Command: {}\n\nGame Log:",
                format_launch_command(&self.ctx.paths.binary, &parts)
            ),
        );

        self.ctx.status_update(app_name, GameStatus::Playing);

        let started = Utc::now();
        let opts = CommandOptions::new(app_name)
            .with_env(env)
            .with_log_prefix(format!("Launching {}", game.title))
            .on_output(|line| self.ctx.game_logs.append(app_name, line));
        let result = run_command(self.ctx.abort.as_ref(), &self.ctx.paths.binary, &parts, opts).await;

        self.ctx.game_logs.close(app_name);
        self.ctx.status_update(app_name, GameStatus::Done);
        let res = result?;

        if res.abort {
            return Ok(true);
        }
        if let Some(err) = &res.error {
            tracing::error!(app = app_name, error = %err, "error launching game");
            return Ok(false);
        }

        self.record_playtime(app_name, started, Utc::now()).await;
        Ok(true)
    }

    async fn sync_saves(
        &self,
        app_name: &str,
        direction: &str,
        locations: &[SaveLocation],
    ) -> Result<String, GameError> {
        if locations.is_empty() {
            return Err(GameError::Validation(
                "no save locations defined".to_string(),
            ));
        }
        self.ctx.require_credentials().await?;
        let record = self
            .ctx
            .installed
            .get(app_name)
            .ok_or_else(|| GameError::NotInstalled(app_name.to_string()))?;

        let mut full_output = String::new();
        for location in locations {
            let mut cursors = self.sync_cursors.get_or(app_name, HashMap::new());
            let timestamp = cursors
                .get(&location.name)
                .cloned()
                .unwrap_or_else(|| "0".to_string());

            let parts = commands::save_sync_args(&SaveSyncParams {
                location_path: &location.path,
                app_name,
                platform: record.platform,
                timestamp: &timestamp,
                name: &location.name,
                direction,
            });

            tracing::info!(app = app_name, location = %location.name, "syncing saves");
            let res = run_command(
                self.ctx.abort.as_ref(),
                &self.ctx.paths.binary,
                &parts,
                CommandOptions::new(app_name)
                    .with_log_prefix(format!("Syncing saves for {app_name}")),
            )
            .await?;

            if let Some(err) = &res.error {
                tracing::error!(app = app_name, error = %err, "failed to sync saves");
            }
            // The backend prints the new cursor on success.
            let cursor = res.stdout.trim();
            if !cursor.is_empty() {
                cursors.insert(location.name.clone(), cursor.to_string());
                self.sync_cursors.set(app_name, cursors)?;
            }
            full_output.push_str(&res.stdout);
        }

        Ok(full_output)
    }

    async fn stop(&self, app_name: &str, stop_compat: bool) -> Result<(), GameError> {
        self.ctx.abort.abort(app_name);

        if stop_compat && !self.is_native(app_name) {
            let config = self.ctx.config.game_config(app_name, Runner::Gog);
            if let Some(wineserver) = config.wine_version.as_ref().and_then(wineserver_path) {
                let mut env = HashMap::new();
                if !config.wine_prefix.is_empty() {
                    env.insert("WINEPREFIX".to_string(), config.wine_prefix.clone());
                }
                let opts = CommandOptions::new(format!("{app_name}-stop"))
                    .with_env(env)
                    .with_log_prefix(format!("Shutting down wine for {app_name}"));
                if let Err(e) = run_command(
                    self.ctx.abort.as_ref(),
                    &wineserver,
                    &["-k".to_string()],
                    opts,
                )
                .await
                {
                    tracing::warn!(app = app_name, error = %e, "wineserver shutdown failed");
                }
            }
        }
        Ok(())
    }
}

fn playtime_load_error(err: gamedock_playtime::PlaytimeError) -> GameError {
    match err {
        gamedock_playtime::PlaytimeError::Registry(e) => GameError::Registry(e),
        other => GameError::Network(other.to_string()),
    }
}

/// One drain pass over the offline playtime queue.
///
/// Skips immediately when another drain holds the lock; otherwise removes
/// exactly the sessions the service acknowledged.
async fn drain_playtime_queue(
    queue: Arc<PlaytimeQueue>,
    client: Arc<PlaytimeClient>,
    credentials: Arc<dyn CredentialsProvider>,
    online: Arc<dyn OnlineMonitor>,
) {
    let Some(creds) = credentials.credentials().await else {
        tracing::error!("unable to sync queued playtime, no credentials");
        return;
    };
    let user_id = creds.user_id;
    let token = creds.access_token;

    let result = queue
        .drain(&user_id, |session| {
            let client = Arc::clone(&client);
            let online = Arc::clone(&online);
            let user = user_id.clone();
            let token = token.clone();
            async move {
                if !online.is_online() {
                    return false;
                }
                client.post_session(&user, &token, &session).await.is_ok()
            }
        })
        .await;

    if let Err(e) = result {
        tracing::error!(error = %e, "playtime queue drain failed");
    }
}
