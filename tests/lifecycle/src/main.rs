fn main() {
    println!("Run `cargo test -p lifecycle-tests` to execute the lifecycle integration tests.");
}

#[cfg(test)]
mod stubs;

/// Whole-pipeline tests: stub `sh` backends under the real supervisor,
/// parser, stores, and workflows.
#[cfg(all(test, unix))]
mod workflows {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use gamedock_core::{GogGames, SideloadGames, StoreManager};
    use gamedock_process::ProcessError;
    use gamedock_protocol::{
        FrontendMessage, GameStatus, InstallArgs, InstallPlatform, InstalledInfo, Runner,
    };
    use gamedock_runner::{GameError, GameManager, InstallStatus, RemoveArgs};

    use crate::stubs::{Harness, StubCredentials, write_script};

    const PROGRESS_SCRIPT: &str = r#"echo "Progress: 42.50 (1391/3273), Running for 00:01:23"
echo "ETA: 00:05:00"
echo "Downloaded: 120.00 MiB"
printf 'Download\t- 3.20 MiB\n'
printf 'Disk\t- 5.10 MiB\n'"#;

    fn install_args(path: &std::path::Path, dlcs: &[&str]) -> InstallArgs {
        InstallArgs {
            path: path.display().to_string(),
            platform: InstallPlatform::Windows,
            install_dlcs: dlcs.iter().map(|s| s.to_string()).collect(),
            language: "en-US".into(),
            build: None,
            branch: None,
        }
    }

    #[tokio::test]
    async fn install_success_persists_record_and_emits_progress() {
        let scripts = tempfile::tempdir().unwrap();
        let backend = write_script(scripts.path(), "gogdl", PROGRESS_SCRIPT);
        let mut harness = Harness::new(Runner::Gog, backend);
        harness.seed_game("1234", "Game-1234");
        let games = GogGames::new(harness.ctx.clone(), harness.dir.path()).unwrap();

        let result = games
            .install(
                "1234",
                &install_args(&harness.dir.path().join("Games"), &["dlc1", "dlc2"]),
            )
            .await
            .unwrap();
        assert_eq!(result.status, InstallStatus::Done);

        let record = harness.ctx.installed.get("1234").unwrap();
        assert_eq!(record.version, "1.0");
        assert_eq!(record.build_id, "build-1");
        assert_eq!(record.version_etag, "etag-1");
        assert_eq!(record.installed_dlcs, vec!["dlc1", "dlc2"]);
        assert!(record.install_path.ends_with("Game-1234"));
        assert!(harness.ctx.library.get("1234").unwrap().is_installed);

        let events = harness.drain_events();
        let progress: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                FrontendMessage::ProgressUpdate {
                    status, progress, ..
                } => Some((status, progress)),
                _ => None,
            })
            .collect();
        // Five lines, five fields: exactly one completed snapshot.
        assert_eq!(progress.len(), 1);
        let (status, snapshot) = progress[0];
        assert_eq!(*status, GameStatus::Installing);
        assert_eq!(snapshot.percent, Some(42.5));
        assert_eq!(snapshot.eta.as_deref(), Some("00:05:00"));
        assert_eq!(snapshot.bytes.as_deref(), Some("120.00MB"));
        assert_eq!(snapshot.down_speed, Some(3.2));
        assert_eq!(snapshot.disk_speed, Some(5.1));

        assert!(
            events
                .iter()
                .any(|event| matches!(event, FrontendMessage::LibraryPush { .. }))
        );
    }

    #[tokio::test]
    async fn install_failure_leaves_registry_unmodified() {
        let scripts = tempfile::tempdir().unwrap();
        let backend = write_script(scripts.path(), "gogdl", "echo 'no space left' >&2; exit 2");
        let harness = Harness::new(Runner::Gog, backend);
        harness.seed_game("1234", "Game-1234");
        let games = GogGames::new(harness.ctx.clone(), harness.dir.path()).unwrap();

        let result = games
            .install("1234", &install_args(&harness.dir.path().join("Games"), &[]))
            .await
            .unwrap();
        assert_eq!(result.status, InstallStatus::Error);
        assert!(result.error.unwrap().contains("no space left"));
        assert!(harness.ctx.installed.get("1234").is_none());
    }

    #[tokio::test]
    async fn cancelled_install_aborts_without_registry_mutation() {
        let scripts = tempfile::tempdir().unwrap();
        let backend = write_script(scripts.path(), "gogdl", "echo started; sleep 30");
        let harness = Harness::new(Runner::Gog, backend);
        harness.seed_game("1234", "Game-1234");
        let games = GogGames::new(harness.ctx.clone(), harness.dir.path()).unwrap();

        let abort = Arc::clone(&harness.ctx.abort);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            assert!(abort.abort("1234"));
        });

        let result = games
            .install("1234", &install_args(&harness.dir.path().join("Games"), &[]))
            .await
            .unwrap();
        assert_eq!(result.status, InstallStatus::Abort);
        assert!(result.error.is_none());
        assert!(harness.ctx.installed.get("1234").is_none());
        // The abort registry entry is gone the moment the process exits.
        assert!(!harness.ctx.abort.is_active("1234"));
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_spawn() {
        let scripts = tempfile::tempdir().unwrap();
        let marker = scripts.path().join("backend-ran");
        let backend = write_script(
            scripts.path(),
            "gogdl",
            &format!("touch {}", marker.display()),
        );
        let harness = Harness::with_credentials(Runner::Gog, backend, StubCredentials(None));
        harness.seed_game("1234", "Game-1234");
        let games = GogGames::new(harness.ctx.clone(), harness.dir.path()).unwrap();

        let err = games
            .install("1234", &install_args(&harness.dir.path().join("Games"), &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Credentials));
        assert!(!marker.exists(), "backend must not have been spawned");
        assert!(harness.ctx.installed.get("1234").is_none());
    }

    #[tokio::test]
    async fn second_operation_for_live_id_is_rejected() {
        let scripts = tempfile::tempdir().unwrap();
        let backend = write_script(scripts.path(), "gogdl", "exit 0");
        let harness = Harness::new(Runner::Gog, backend);
        harness.seed_game("1234", "Game-1234");
        let games = GogGames::new(harness.ctx.clone(), harness.dir.path()).unwrap();

        let _held = harness.ctx.abort.register("1234").unwrap();
        let err = games
            .install("1234", &install_args(&harness.dir.path().join("Games"), &[]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GameError::Supervisor(ProcessError::AlreadyRunning(_))
        ));
    }

    #[tokio::test]
    async fn uninstall_of_unknown_game_is_fatal() {
        let scripts = tempfile::tempdir().unwrap();
        let backend = write_script(scripts.path(), "gogdl", "exit 0");
        let harness = Harness::new(Runner::Gog, backend);
        let games = GogGames::new(harness.ctx.clone(), harness.dir.path()).unwrap();

        let err = games
            .uninstall(&RemoveArgs {
                app_name: "ghost".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::NotInstalled(app) if app == "ghost"));
    }

    #[tokio::test]
    async fn uninstall_tolerates_half_cleaned_directory() {
        let scripts = tempfile::tempdir().unwrap();
        let backend = write_script(scripts.path(), "gogdl", "exit 0");
        let mut harness = Harness::new(Runner::Gog, backend);
        harness.seed_game("1234", "Game-1234");
        // The install directory is already gone, as after a crashed
        // cleanup; the registry still says installed.
        harness.seed_installed(
            "1234",
            &harness.dir.path().join("Games").join("gone"),
            InstallPlatform::Windows,
        );
        let games = GogGames::new(harness.ctx.clone(), harness.dir.path()).unwrap();

        games
            .uninstall(&RemoveArgs {
                app_name: "1234".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(harness.ctx.installed.get("1234").is_none());
        assert!(!harness.ctx.library.get("1234").unwrap().is_installed);
        assert!(
            harness
                .drain_events()
                .iter()
                .any(|event| matches!(event, FrontendMessage::LibraryPush { .. }))
        );
    }

    #[tokio::test]
    async fn move_updates_registry_only_after_files_moved() {
        let scripts = tempfile::tempdir().unwrap();
        let backend = write_script(scripts.path(), "gogdl", "exit 0");
        let harness = Harness::new(Runner::Gog, backend);
        harness.seed_game("1234", "Game-1234");

        let source = harness.dir.path().join("Games").join("Game-1234");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("data.pak"), b"bytes").unwrap();
        harness.seed_installed("1234", &source, InstallPlatform::Windows);
        let games = GogGames::new(harness.ctx.clone(), harness.dir.path()).unwrap();

        let new_base = harness.dir.path().join("SSD");
        let result = games.move_install("1234", &new_base).await.unwrap();
        assert_eq!(result.status, InstallStatus::Done);

        let record = harness.ctx.installed.get("1234").unwrap();
        assert_eq!(
            record.install_path,
            new_base.join("Game-1234").display().to_string()
        );
        assert!(new_base.join("Game-1234").join("data.pak").exists());
        assert!(!source.exists());
    }

    #[tokio::test]
    async fn failed_move_leaves_record_untouched() {
        let scripts = tempfile::tempdir().unwrap();
        let backend = write_script(scripts.path(), "gogdl", "exit 0");
        let harness = Harness::new(Runner::Gog, backend);
        harness.seed_game("1234", "Game-1234");

        let source = harness.dir.path().join("Games").join("Game-1234");
        std::fs::create_dir_all(&source).unwrap();
        harness.seed_installed("1234", &source, InstallPlatform::Windows);
        let games = GogGames::new(harness.ctx.clone(), harness.dir.path()).unwrap();

        // Destination already occupied.
        let new_base = harness.dir.path().join("SSD");
        std::fs::create_dir_all(new_base.join("Game-1234")).unwrap();
        let result = games.move_install("1234", &new_base).await.unwrap();
        assert_eq!(result.status, InstallStatus::Error);

        let record = harness.ctx.installed.get("1234").unwrap();
        assert_eq!(record.install_path, source.display().to_string());
        assert!(source.exists());
    }

    // Relies on a Linux build being native on the host.
    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn sideload_launch_runs_executable_and_writes_game_log() {
        let scripts = tempfile::tempdir().unwrap();
        let game_bin = write_script(scripts.path(), "game.sh", r#"echo "hello game""#);
        let mut harness = Harness::new(Runner::Sideload, PathBuf::from("/unused"));
        harness.seed_game("side-1", "");
        harness
            .ctx
            .installed
            .insert(InstalledInfo {
                app_name: "side-1".into(),
                platform: InstallPlatform::Linux,
                executable: game_bin.display().to_string(),
                install_path: scripts.path().display().to_string(),
                install_size: String::new(),
                version: String::new(),
                build_id: String::new(),
                version_etag: String::new(),
                branch: None,
                language: String::new(),
                installed_dlcs: vec![],
                pinned_version: false,
            })
            .unwrap();
        harness
            .ctx
            .library
            .refresh_installed(&harness.ctx.installed)
            .unwrap();
        let games = SideloadGames::new(harness.ctx.clone());

        assert!(games.launch("side-1", &[]).await.unwrap());

        let log = std::fs::read_to_string(harness.ctx.paths.game_log_path("side-1")).unwrap();
        assert!(log.contains("Launch Command:"));
        assert!(log.contains("hello game"));

        let statuses: Vec<GameStatus> = harness
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                FrontendMessage::StatusUpdate { status, .. } => Some(status),
                _ => None,
            })
            .collect();
        assert_eq!(statuses, vec![GameStatus::Playing, GameStatus::Done]);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn store_manager_routes_through_the_shared_contract() {
        let scripts = tempfile::tempdir().unwrap();
        let game_bin = write_script(scripts.path(), "game.sh", "exit 0");
        let mut harness = Harness::new(Runner::Sideload, PathBuf::from("/unused"));
        harness.seed_game("side-1", "");
        harness
            .ctx
            .installed
            .insert(InstalledInfo {
                app_name: "side-1".into(),
                platform: InstallPlatform::Linux,
                executable: game_bin.display().to_string(),
                install_path: scripts.path().display().to_string(),
                install_size: String::new(),
                version: String::new(),
                build_id: String::new(),
                version_etag: String::new(),
                branch: None,
                language: String::new(),
                installed_dlcs: vec![],
                pinned_version: false,
            })
            .unwrap();
        harness
            .ctx
            .library
            .refresh_installed(&harness.ctx.installed)
            .unwrap();

        let manager = StoreManager::Sideload(SideloadGames::new(harness.ctx.clone()));
        assert_eq!(manager.runner(), Runner::Sideload);
        assert!(manager.game_info("side-1").unwrap().is_installed);
        assert!(manager.is_game_available("side-1").await);
        assert!(manager.launch("side-1", &[]).await.unwrap());
        let _ = harness.drain_events();
    }

    #[tokio::test]
    async fn launch_of_deleted_install_is_classified() {
        let mut harness = Harness::new(Runner::Sideload, PathBuf::from("/unused"));
        harness.seed_game("side-1", "");
        harness.seed_installed(
            "side-1",
            &harness.dir.path().join("deleted-game"),
            InstallPlatform::Linux,
        );
        let games = SideloadGames::new(harness.ctx.clone());

        let err = games.launch("side-1", &[]).await.unwrap_err();
        assert!(matches!(err, GameError::AppearsDeleted(_)));
        assert!(
            harness
                .drain_events()
                .iter()
                .any(|event| matches!(event, FrontendMessage::ShowDialog { .. }))
        );
    }
}

/// Telemetry delivery against a real loopback HTTP listener.
#[cfg(test)]
mod telemetry {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use gamedock_playtime::{DrainOutcome, PlaytimeClient, PlaytimeQueue, PlaytimeSession};

    use crate::stubs::spawn_http_server;

    fn session(app: &str) -> PlaytimeSession {
        PlaytimeSession {
            session_date: 1_700_000_000,
            time: 30,
            app_name: app.into(),
        }
    }

    #[tokio::test]
    async fn post_session_accepts_only_201() {
        let (url, _) = spawn_http_server("201 Created", "").await;
        let client = PlaytimeClient::new(url);
        client
            .post_session("user-1", "token", &session("1234"))
            .await
            .unwrap();

        let (url, _) = spawn_http_server("503 Service Unavailable", "").await;
        let client = PlaytimeClient::new(url);
        assert!(
            client
                .post_session("user-1", "token", &session("1234"))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn rejected_session_stays_queued() {
        let (url, hits) = spawn_http_server("503 Service Unavailable", "").await;
        let client = Arc::new(PlaytimeClient::new(url));
        let dir = tempfile::tempdir().unwrap();
        let queue = PlaytimeQueue::load(dir.path().join("queue.json")).unwrap();
        queue.enqueue("user-1", session("a")).unwrap();

        let outcome = queue
            .drain("user-1", |s| {
                let client = Arc::clone(&client);
                async move { client.post_session("user-1", "token", &s).await.is_ok() }
            })
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DrainOutcome::Drained {
                delivered: 0,
                kept: 1
            }
        );
        assert_eq!(queue.pending("user-1").len(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!queue.is_locked());
    }

    #[tokio::test]
    async fn drain_removes_exactly_the_delivered_sessions() {
        let (url, hits) = spawn_http_server("201 Created", "").await;
        let client = Arc::new(PlaytimeClient::new(url));
        let dir = tempfile::tempdir().unwrap();
        let queue = PlaytimeQueue::load(dir.path().join("queue.json")).unwrap();
        queue.enqueue("user-1", session("a")).unwrap();
        queue.enqueue("user-1", session("b")).unwrap();

        let outcome = queue
            .drain("user-1", |s| {
                let client = Arc::clone(&client);
                async move { client.post_session("user-1", "token", &s).await.is_ok() }
            })
            .await
            .unwrap();

        assert_eq!(
            outcome,
            DrainOutcome::Drained {
                delivered: 2,
                kept: 0
            }
        );
        assert!(queue.pending("user-1").is_empty());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn locked_queue_performs_zero_network_calls() {
        let (url, hits) = spawn_http_server("201 Created", "").await;
        let client = Arc::new(PlaytimeClient::new(url));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        // A lock marker left behind by an in-flight drain.
        std::fs::write(
            &path,
            r#"{"lock": [], "user-1": [{"session_date": 1, "time": 5, "appName": "a"}]}"#,
        )
        .unwrap();
        let queue = PlaytimeQueue::load(path).unwrap();
        assert!(queue.is_locked());

        let outcome = queue
            .drain("user-1", |s| {
                let client = Arc::clone(&client);
                async move { client.post_session("user-1", "token", &s).await.is_ok() }
            })
            .await
            .unwrap();

        assert_eq!(outcome, DrainOutcome::Locked);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(queue.pending("user-1").len(), 1);
    }

    #[tokio::test]
    async fn aggregate_playtime_is_read_from_time_sum() {
        let (url, _) = spawn_http_server("200 OK", r#"{"time_sum": 420}"#).await;
        let client = PlaytimeClient::new(url);
        let minutes = client.playtime("1234", "user-1", "token").await.unwrap();
        assert_eq!(minutes, 420);
    }
}
