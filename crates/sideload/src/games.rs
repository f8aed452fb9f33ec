//! Sideload lifecycle workflows.

use std::collections::HashMap;
use std::path::Path;

use gamedock_launch::{
    CompatKind, merge_env_layers, prepare_compat_launch, prepare_launch, setup_wrappers,
    wineserver_path, wrapper_env_vars,
};
use gamedock_process::{CommandOptions, run_command};
use gamedock_protocol::{
    ExecResult, GameInfo, GameStatus, HostPlatform, InstallArgs, InstallPlatform, InstalledInfo,
    Runner, SaveLocation, UpdateOverrides,
};
use gamedock_runner::{
    GameError, GameManager, InstallResult, RemoveArgs, StoreContext, cleanup,
};

/// The sideload backend.
pub struct SideloadGames {
    ctx: StoreContext,
}

impl SideloadGames {
    pub fn new(ctx: StoreContext) -> Self {
        Self { ctx }
    }

    /// Registers a sideloaded game: library entry plus installed record.
    ///
    /// This is the shell's "add game" entry point; the executable comes
    /// from the user, not from any backend.
    pub async fn add_app(
        &self,
        game: GameInfo,
        installed: InstalledInfo,
    ) -> Result<(), GameError> {
        let app_name = game.app_name.clone();
        self.ctx.library.upsert(game)?;
        self.ctx.installed.insert(installed)?;
        self.ctx.library.refresh_installed(&self.ctx.installed)?;
        if let Some(game) = self.ctx.library.get(&app_name) {
            self.ctx.shortcuts.add(&game).await;
        }
        self.ctx.push_library_update(&app_name);
        Ok(())
    }
}

impl GameManager for SideloadGames {
    fn runner(&self) -> Runner {
        Runner::Sideload
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
        if !path.exists() {
            return Err(GameError::Filesystem(format!(
                "folder not found: {}",
                path.display()
            )));
        }

        let size = self.ctx.disk.path_disk_size(path).await;
        let installed = InstalledInfo {
            app_name: app_name.to_string(),
            platform,
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
        self.ctx.push_library_update(app_name);
        Ok(ExecResult::default())
    }

    async fn install(
        &self,
        _app_name: &str,
        _args: &InstallArgs,
    ) -> Result<InstallResult, GameError> {
        // There is no backend to download from; games are added directly.
        Err(GameError::Validation(
            "sideloaded games are added, not installed".to_string(),
        ))
    }

    async fn update(
        &self,
        _app_name: &str,
        _overrides: Option<&UpdateOverrides>,
    ) -> Result<InstallResult, GameError> {
        Err(GameError::Validation(
            "sideloaded games have no update source".to_string(),
        ))
    }

    async fn repair(&self, _app_name: &str) -> Result<ExecResult, GameError> {
        Err(GameError::Validation(
            "sideloaded games have no manifest to repair against".to_string(),
        ))
    }

    async fn uninstall(&self, args: &RemoveArgs) -> Result<ExecResult, GameError> {
        let app_name = args.app_name.as_str();
        let record = self
            .ctx
            .installed
            .get(app_name)
            .ok_or_else(|| GameError::NotInstalled(app_name.to_string()))?;

        if args.delete_files {
            cleanup::remove_dir_best_effort(Path::new(&record.install_path));
        }

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

        if let Err(e) = gamedock_runner::moves::move_game_directory(source, &destination) {
            tracing::error!(app = app_name, error = %e, "failed to move install");
            return Ok(InstallResult::failed(e.to_string()));
        }

        let old_path = record.install_path.clone();
        self.ctx.installed.update(app_name, |info| {
            info.install_path = destination.display().to_string();
            // The executable lives inside the moved directory.
            if let Some(relative) = info.executable.strip_prefix(&old_path) {
                info.executable = format!("{}{relative}", destination.display());
            }
        })?;
        self.ctx.library.refresh_installed(&self.ctx.installed)?;
        self.ctx.push_library_update(app_name);
        Ok(InstallResult::done())
    }

    async fn launch(&self, app_name: &str, launch_args: &[String]) -> Result<bool, GameError> {
        let config = self.ctx.config.game_config(app_name, Runner::Sideload);
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

        let executable = config
            .target_exe
            .clone()
            .unwrap_or_else(|| install.executable.clone());
        if executable.is_empty() {
            return Err(GameError::Validation(format!(
                "no executable recorded for {app_name}"
            )));
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

        // With no backend CLI in between, the wrapper chain and compat
        // layer wrap the executable itself.
        let mut tokens = setup_wrappers(&config, &prep);
        let wrapper_vars = wrapper_env_vars(app_name, Runner::Sideload);
        let mut compat_vars = HashMap::new();

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
            tokens.push(compat.layer.binary.display().to_string());
            if compat.layer.kind == CompatKind::Proton {
                tokens.push("run".to_string());
            }
        }

        tokens.push(executable);
        tokens.extend(launch_args.iter().cloned());
        tokens.extend(config.launcher_args.iter().cloned());

        let env = merge_env_layers(&[&wrapper_vars, &compat_vars, &config.env]);
        let binary = Path::new(&tokens[0]).to_path_buf();
        let args: Vec<String> = tokens[1..].to_vec();

        self.ctx.game_logs.append(
            app_name,
            &format!(
                "Launch Command: {}\n\nGame Log:",
                gamedock_launch::format_launch_command(&binary, &args)
            ),
        );
        self.ctx.status_update(app_name, GameStatus::Playing);

        let opts = CommandOptions::new(app_name)
            .with_env(env)
            .with_log_prefix(format!("Launching {}", game.title))
            .on_output(|line| self.ctx.game_logs.append(app_name, line));
        let result = run_command(self.ctx.abort.as_ref(), &binary, &args, opts).await;

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
        Err(GameError::Validation(
            "sideloaded games have no cloud saves".to_string(),
        ))
    }

    async fn stop(&self, app_name: &str, stop_compat: bool) -> Result<(), GameError> {
        self.ctx.abort.abort(app_name);
        if stop_compat && !self.is_native(app_name) {
            let config = self.ctx.config.game_config(app_name, Runner::Sideload);
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
