//! Supervised execution of backend CLI processes.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use gamedock_protocol::ExecResult;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::{AbortRegistry, ProcessError};

/// Longest stderr excerpt carried in `ExecResult::error`.
const STDERR_TAIL_CHARS: usize = 1024;

/// Options for one supervised command.
pub struct CommandOptions<'a> {
    /// Logical operation id; at most one live process per id.
    pub abort_id: String,
    /// Extra environment variables layered over the inherited environment.
    pub env: HashMap<String, String>,
    /// Called synchronously for every stdout line, before the line is
    /// appended to the log file.
    pub on_output: Option<Box<dyn FnMut(&str) + Send + 'a>>,
    /// Log file output lines are appended to, best-effort.
    pub log_file: Option<PathBuf>,
    /// Short label used in tracing output.
    pub log_prefix: Option<String>,
}

impl<'a> CommandOptions<'a> {
    pub fn new(abort_id: impl Into<String>) -> Self {
        Self {
            abort_id: abort_id.into(),
            env: HashMap::new(),
            on_output: None,
            log_file: None,
            log_prefix: None,
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_log_file(mut self, path: PathBuf) -> Self {
        self.log_file = Some(path);
        self
    }

    pub fn with_log_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.log_prefix = Some(prefix.into());
        self
    }

    pub fn on_output(mut self, callback: impl FnMut(&str) + Send + 'a) -> Self {
        self.on_output = Some(Box::new(callback));
        self
    }
}

/// Runs `binary args` under supervision.
///
/// The operation id is registered before the spawn and removed
/// unconditionally after the process exits, whatever the outcome.
/// Cancellation through the registry kills the process and yields
/// `abort = true`, which callers must not treat as an error. A non-zero
/// exit without abort yields `error` carrying a stderr excerpt.
pub async fn run_command(
    registry: &AbortRegistry,
    binary: &Path,
    args: &[String],
    opts: CommandOptions<'_>,
) -> Result<ExecResult, ProcessError> {
    let id = opts.abort_id.clone();
    let token = registry.register(&id)?;
    let result = supervise(binary, args, opts, token).await;
    registry.finish(&id);
    result
}

async fn supervise(
    binary: &Path,
    args: &[String],
    mut opts: CommandOptions<'_>,
    token: CancellationToken,
) -> Result<ExecResult, ProcessError> {
    let prefix = opts
        .log_prefix
        .clone()
        .unwrap_or_else(|| binary.display().to_string());
    tracing::info!(id = %opts.abort_id, binary = %binary.display(), "{prefix}");

    let mut cmd = Command::new(binary);
    cmd.args(args)
        .envs(&opts.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
        binary: binary.display().to_string(),
        source,
    })?;

    // Logging is best-effort: a log file that cannot be opened or written
    // must never fail the operation.
    let mut log = opts.log_file.as_ref().and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("child stdout not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("child stderr not captured"))?;
    let mut out_lines = BufReader::new(stdout).lines();
    let mut err_lines = BufReader::new(stderr).lines();

    let mut stdout_buf = String::new();
    let mut stderr_buf = String::new();
    let mut stdout_done = false;
    let mut stderr_done = false;
    let mut aborted = false;

    while !(stdout_done && stderr_done) {
        tokio::select! {
            line = out_lines.next_line(), if !stdout_done => match line {
                Ok(Some(line)) => {
                    if let Some(callback) = opts.on_output.as_mut() {
                        callback(&line);
                    }
                    if let Some(file) = log.as_mut() {
                        let _ = writeln!(file, "{line}");
                    }
                    stdout_buf.push_str(&line);
                    stdout_buf.push('\n');
                }
                Ok(None) => stdout_done = true,
                Err(e) => {
                    tracing::debug!(error = %e, "stdout read failed");
                    stdout_done = true;
                }
            },
            line = err_lines.next_line(), if !stderr_done => match line {
                Ok(Some(line)) => {
                    if let Some(file) = log.as_mut() {
                        let _ = writeln!(file, "{line}");
                    }
                    stderr_buf.push_str(&line);
                    stderr_buf.push('\n');
                }
                Ok(None) => stderr_done = true,
                Err(e) => {
                    tracing::debug!(error = %e, "stderr read failed");
                    stderr_done = true;
                }
            },
            _ = token.cancelled() => {
                aborted = true;
                break;
            }
        }
    }

    if aborted {
        if let Err(e) = child.kill().await {
            tracing::warn!(id = %opts.abort_id, error = %e, "failed to kill aborted process");
        }
        tracing::info!(id = %opts.abort_id, "process aborted");
        return Ok(ExecResult {
            stdout: stdout_buf,
            stderr: stderr_buf,
            error: None,
            abort: true,
            exit_code: None,
        });
    }

    let status = child.wait().await?;

    // Cancellation can land between stream EOF and process exit.
    if token.is_cancelled() {
        tracing::info!(id = %opts.abort_id, "process aborted at exit");
        return Ok(ExecResult {
            stdout: stdout_buf,
            stderr: stderr_buf,
            error: None,
            abort: true,
            exit_code: status.code(),
        });
    }

    let exit_code = status.code();
    if status.success() {
        Ok(ExecResult {
            stdout: stdout_buf,
            stderr: stderr_buf,
            error: None,
            abort: false,
            exit_code,
        })
    } else {
        let error = stderr_excerpt(&stderr_buf, exit_code);
        tracing::error!(id = %opts.abort_id, ?exit_code, error = %error, "process failed");
        Ok(ExecResult {
            stdout: stdout_buf,
            stderr: stderr_buf,
            error: Some(error),
            abort: false,
            exit_code,
        })
    }
}

/// Tail of stderr, bounded to keep UI-facing errors readable.
fn stderr_excerpt(stderr: &str, exit_code: Option<i32>) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return match exit_code {
            Some(code) => format!("process exited with code {code}"),
            None => "process terminated by signal".to_string(),
        };
    }
    let start = trimmed
        .char_indices()
        .rev()
        .nth(STDERR_TAIL_CHARS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    trimmed[start..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn sh() -> PathBuf {
        PathBuf::from("/bin/sh")
    }

    fn sh_args(script: &str) -> Vec<String> {
        vec!["-c".into(), script.into()]
    }

    #[tokio::test]
    async fn successful_command_collects_stdout() {
        let registry = AbortRegistry::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);

        let res = run_command(
            &registry,
            &sh(),
            &sh_args("echo one; echo two"),
            CommandOptions::new("ok").on_output(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await
        .unwrap();

        assert!(res.success());
        assert_eq!(res.exit_code, Some(0));
        assert_eq!(res.stdout, "one\ntwo\n");
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert!(!registry.is_active("ok"));
    }

    #[tokio::test]
    async fn nonzero_exit_carries_stderr() {
        let registry = AbortRegistry::new();
        let res = run_command(
            &registry,
            &sh(),
            &sh_args("echo boom >&2; exit 3"),
            CommandOptions::new("fail"),
        )
        .await
        .unwrap();

        assert!(!res.success());
        assert!(!res.abort);
        assert_eq!(res.exit_code, Some(3));
        assert_eq!(res.error.as_deref(), Some("boom"));
        assert!(!registry.is_active("fail"));
    }

    #[tokio::test]
    async fn nonzero_exit_without_stderr_reports_code() {
        let registry = AbortRegistry::new();
        let res = run_command(&registry, &sh(), &sh_args("exit 7"), CommandOptions::new("t"))
            .await
            .unwrap();
        assert_eq!(res.error.as_deref(), Some("process exited with code 7"));
    }

    #[tokio::test]
    async fn abort_kills_process_and_clears_registry() {
        let registry = Arc::new(AbortRegistry::new());

        let aborter = Arc::clone(&registry);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            assert!(aborter.abort("long"));
        });

        let res = run_command(
            &registry,
            &sh(),
            &sh_args("echo started; sleep 30"),
            CommandOptions::new("long"),
        )
        .await
        .unwrap();

        assert!(res.abort);
        assert!(res.error.is_none());
        assert!(!registry.is_active("long"));
    }

    #[tokio::test]
    async fn duplicate_abort_id_is_rejected() {
        let registry = AbortRegistry::new();
        let _held = registry.register("busy").unwrap();

        let err = run_command(&registry, &sh(), &sh_args("true"), CommandOptions::new("busy"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::AlreadyRunning(_)));

        // The pre-existing registration must survive the rejection.
        assert!(registry.is_active("busy"));
    }

    #[tokio::test]
    async fn output_is_appended_to_log_file() {
        let registry = AbortRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("install.log");

        let res = run_command(
            &registry,
            &sh(),
            &sh_args("echo alpha; echo beta >&2"),
            CommandOptions::new("logged").with_log_file(log_path.clone()),
        )
        .await
        .unwrap();

        assert!(res.success());
        let contents = std::fs::read_to_string(&log_path).unwrap();
        assert!(contents.contains("alpha"));
        assert!(contents.contains("beta"));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let registry = AbortRegistry::new();
        let err = run_command(
            &registry,
            Path::new("/nonexistent/gamedock-backend"),
            &[],
            CommandOptions::new("ghost"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
        assert!(!registry.is_active("ghost"));
    }

    #[test]
    fn stderr_excerpt_truncates_long_output() {
        let long = "x".repeat(5000);
        let excerpt = stderr_excerpt(&long, Some(1));
        assert_eq!(excerpt.chars().count(), STDERR_TAIL_CHARS);
    }
}
