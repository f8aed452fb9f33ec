//! Amazon lifecycle workflows.

use std::collections::HashMap;
use std::path::Path;

use gamedock_launch::{
    format_launch_command, join_wrappers, merge_env_layers, prepare_compat_launch, prepare_launch,
    setup_wrappers, wine_flags, wineserver_path, wrapper_env_vars,
};
use gamedock_process::{CommandOptions, run_command};
use gamedock_protocol::{
    ExecResult, GameInfo, GameStatus, HostPlatform, InstallArgs, InstallPlatform, InstalledInfo,
    Runner, SaveLocation, UpdateOverrides,
};
use gamedock_runner::{
    GameError, GameManager, InstallResult, RemoveArgs, StoreContext, cleanup,
};

use crate::commands::{self, DownloadParams, LaunchParams, RepairParams, UpdateParams};

/// The Amazon backend.
pub struct NileGames {
    ctx: StoreContext,
}

impl NileGames {
    pub fn new(ctx: StoreContext) -> Self {
        Self { ctx }
    }
}

impl GameManager for NileGames {
    fn runner(&self) -> Runner {
        Runner::Nile
    }

    fn game_info(&self, app_name: &str) -> Option<GameInfo> {
        self.ctx.library.get(app_name)
    }

    fn is_native(&self, _app_name: &str) -> bool {
        // Windows builds only.
        HostPlatform::current() == HostPlatform::Windows
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
        _platform: InstallPlatform,
    ) -> Result<ExecResult, GameError> {
        let parts = commands::import_args(app_name, path);
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

        let size = self.ctx.disk.path_disk_size(path).await;
        let installed = InstalledInfo {
            app_name: app_name.to_string(),
            platform: InstallPlatform::Windows,
            executable: String::new(),
            install_path: path.display().to_string(),
            install_size: self.ctx.disk.format_size(size),
            version: String::new(),
            build_id: String::new(),
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
        Ok(res)
    }

    async fn install(&self, app_name: &str, args: &InstallArgs) -> Result<InstallResult, GameError> {
        args.validate(&commands::SUPPORTED_PLATFORMS)?;
        self.ctx.require_credentials().await?;

        let global = self.ctx.config.global_config();
        let parts = commands::download_args(&DownloadParams {
            app_name,
            args,
            workers: global.max_download_workers,
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

        let metadata = match self
            .ctx
            .metadata
            .install_metadata(app_name, args.platform, None, None)
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
        let folder = if game.folder_name.is_empty() {
            game.title.clone()
        } else {
            game.folder_name.clone()
        };

        let install_path = Path::new(&args.path).join(folder);
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
        Ok(InstallResult::done())
    }

    async fn update(
        &self,
        app_name: &str,
        _overrides: Option<&UpdateOverrides>,
    ) -> Result<InstallResult, GameError> {
        let record = self
            .ctx
            .installed
            .get(app_name)
            .ok_or_else(|| GameError::NotInstalled(app_name.to_string()))?;
        self.ctx.require_credentials().await?;

        let global = self.ctx.config.global_config();
        let parts = commands::update_args(&UpdateParams {
            app_name,
            install_path: &record.install_path,
            workers: global.max_download_workers,
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
            .install_metadata(app_name, record.platform, None, None)
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
            info.install_size = size_label.clone();
        })?;
        self.ctx.library.refresh_installed(&self.ctx.installed)?;
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

        let global = self.ctx.config.global_config();
        let parts = commands::repair_args(&RepairParams {
            app_name,
            install_path: &record.install_path,
            workers: global.max_download_workers,
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
        let record = self
            .ctx
            .installed
            .get(app_name)
            .ok_or_else(|| GameError::NotInstalled(app_name.to_string()))?;

        tracing::info!(app = app_name, path = %record.install_path, "removing game");

        cleanup::remove_dir_best_effort(Path::new(&record.install_path));
        cleanup::remove_file_best_effort(&self.ctx.paths.manifest_path(app_name));

        self.ctx.installed.remove(app_name)?;
        self.ctx.library.refresh_installed(&self.ctx.installed)?;
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

        if let Err(e) = gamedock_runner::moves::move_game_directory(source, &destination) {
            tracing::error!(app = app_name, error = %e, "failed to move install");
            return Ok(InstallResult::failed(e.to_string()));
        }

        self.ctx.installed.update(app_name, |info| {
            info.install_path = destination.display().to_string();
        })?;
        self.ctx.library.refresh_installed(&self.ctx.installed)?;
        self.ctx.push_library_update(app_name);
        Ok(InstallResult::done())
    }

    async fn launch(&self, app_name: &str, launch_args: &[String]) -> Result<bool, GameError> {
        let config = self.ctx.config.game_config(app_name, Runner::Nile);
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

        let wrapper_vars = wrapper_env_vars(app_name, Runner::Nile);
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

        let parts = commands::launch_args(&LaunchParams {
            app_name,
            wine_flags: &wine_flag,
            user_args: launch_args,
            launcher_args: &config.launcher_args,
        });

        self.ctx.game_logs.append(
            app_name,
            &format!(
                "Launch Command: {}\n\nGame Log:",
                format_launch_command(&self.ctx.paths.binary, &parts)
            ),
        );
        self.ctx.status_update(app_name, GameStatus::Playing);

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
        Ok(true)
    }

    async fn sync_saves(
        &self,
        _app_name: &str,
        _direction: &str,
        _locations: &[SaveLocation],
    ) -> Result<String, GameError> {
        // Amazon has no cloud-save service.
        Err(GameError::Validation(
            "save sync is not supported for Amazon games".to_string(),
        ))
    }

    async fn stop(&self, app_name: &str, stop_compat: bool) -> Result<(), GameError> {
        self.ctx.abort.abort(app_name);
        if stop_compat && !self.is_native(app_name) {
            let config = self.ctx.config.game_config(app_name, Runner::Nile);
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
