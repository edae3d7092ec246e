//! Process launching for the installer.
//!
//! Stages describe commands as [`CommandSpec`] values and hand them to a
//! [`CommandRunner`]. The system implementation uses `tokio::process`; tests
//! substitute a scripted runner.

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    #[must_use]
    pub fn envs(mut self, envs: &[(String, String)]) -> Self {
        self.envs.extend_from_slice(envs);
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command.envs(self.envs.iter().map(|(k, v)| (k, v)));
        command
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }

    /// stderr first, since that is where git and cargo put diagnostics.
    #[must_use]
    pub fn diagnostics(&self) -> String {
        match (self.stderr.trim(), self.stdout.trim()) {
            ("", out) => out.to_string(),
            (err, "") => err.to_string(),
            (err, out) => format!("{err}\n{out}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Command timed out")]
    TimedOut,

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while running command: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs to completion and captures stdout and stderr separately.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunError>;

    /// Runs to completion, feeding every stdout and stderr line to `on_line`
    /// as it arrives. The merged text ends up in `stdout`. Not bounded by
    /// the short-command timeout.
    async fn run_streaming(
        &self,
        spec: &CommandSpec,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<CommandOutput, RunError>;

    /// Starts the process and lets it outlive the caller. Returns its pid.
    fn spawn_detached(&self, spec: &CommandSpec) -> Result<Option<u32>, RunError>;
}

pub struct SystemRunner {
    timeout: Duration,
}

impl SystemRunner {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunError> {
        debug!("Running: {}", spec);

        let mut command = spec.command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|source| RunError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RunError::TimedOut)??;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn run_streaming(
        &self,
        spec: &CommandSpec,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<CommandOutput, RunError> {
        debug!("Running (streaming): {}", spec);

        let mut command = spec.command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| RunError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, tx);
        } else {
            drop(tx);
        }

        let mut merged = String::new();
        while let Some(line) = rx.recv().await {
            on_line(&line);
            merged.push_str(&line);
            merged.push('\n');
        }
        let status = child.wait().await?;

        Ok(CommandOutput {
            code: status.code(),
            stdout: merged,
            stderr: String::new(),
        })
    }

    fn spawn_detached(&self, spec: &CommandSpec) -> Result<Option<u32>, RunError> {
        debug!("Launching detached: {}", spec);

        let mut command = spec.command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|source| RunError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        Ok(child.id())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_exit_code_and_stderr() {
        let runner = SystemRunner::new(Duration::from_secs(10));
        let spec = CommandSpec::new("sh")
            .arg("-c")
            .arg("echo out; echo oops >&2; exit 3");

        let output = runner.run(&spec).await.unwrap();
        assert_eq!(output.code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.diagnostics(), "oops\nout");
    }

    #[tokio::test]
    async fn streaming_sees_both_streams() {
        let runner = SystemRunner::new(Duration::from_secs(10));
        let spec = CommandSpec::new("sh")
            .arg("-c")
            .arg("echo one; echo two >&2; echo three");

        let mut seen = Vec::new();
        let output = runner
            .run_streaming(&spec, &mut |line| seen.push(line.to_string()))
            .await
            .unwrap();

        assert!(output.success());
        seen.sort();
        assert_eq!(seen, vec!["one", "three", "two"]);
    }

    #[tokio::test]
    async fn slow_commands_time_out() {
        let runner = SystemRunner::new(Duration::from_millis(100));
        let spec = CommandSpec::new("sleep").arg("5");

        let err = runner.run(&spec).await.unwrap_err();
        assert!(matches!(err, RunError::TimedOut));
        assert_eq!(err.to_string(), "Command timed out");
    }

    #[tokio::test]
    async fn streaming_build_outlives_short_timeout() {
        let runner = SystemRunner::new(Duration::from_millis(200));
        let spec = CommandSpec::new("sh")
            .arg("-c")
            .arg("echo Compiling a v1; sleep 1; echo Finished");

        let mut seen = Vec::new();
        let output = runner
            .run_streaming(&spec, &mut |line| seen.push(line.to_string()))
            .await
            .unwrap();

        assert!(output.success());
        assert_eq!(seen, vec!["Compiling a v1", "Finished"]);
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let runner = SystemRunner::new(Duration::from_secs(1));
        let spec = CommandSpec::new("definitely-not-a-real-program-xyz");

        let err = runner.run(&spec).await.unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }));
    }
}
