use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use team_tracker::installer::requirements::ToolVersion;
use team_tracker::installer::{
    CommandOutput, CommandRunner, CommandSpec, InstallContext, InstallError, InstallOptions,
    Pipeline, RunError,
};

/// Scripted runner: every command succeeds unless its rendered form contains
/// one of the configured failure patterns.
#[derive(Default)]
struct FakeRunner {
    failures: Vec<(String, CommandOutput)>,
    build_lines: Vec<String>,
    calls: Mutex<Vec<String>>,
    detached: Mutex<Vec<String>>,
}

impl FakeRunner {
    fn failing(mut self, prefix: &str, stderr: &str) -> Self {
        self.failures.push((
            prefix.to_string(),
            CommandOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        ));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn detached(&self) -> Vec<String> {
        self.detached.lock().unwrap().clone()
    }

    fn respond(&self, spec: &CommandSpec) -> CommandOutput {
        let rendered = spec.to_string();
        self.calls.lock().unwrap().push(rendered.clone());

        if let Some((_, output)) = self
            .failures
            .iter()
            .find(|(prefix, _)| rendered.contains(prefix.as_str()))
        {
            return output.clone();
        }

        let stdout = match spec.program.as_str() {
            "rustc" => "rustc 1.88.0 (6b00bc388 2025-06-23)\n",
            "git" if spec.args.first().map(String::as_str) == Some("--version") => {
                "git version 2.43.0\n"
            }
            "cargo" => "cargo 1.88.0 (873a06493 2025-05-10)\n",
            _ => "",
        };

        CommandOutput {
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunError> {
        Ok(self.respond(spec))
    }

    async fn run_streaming(
        &self,
        spec: &CommandSpec,
        on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<CommandOutput, RunError> {
        let output = self.respond(spec);
        for line in &self.build_lines {
            on_line(line);
        }
        Ok(output)
    }

    fn spawn_detached(&self, spec: &CommandSpec) -> Result<Option<u32>, RunError> {
        let rendered = spec.to_string();
        self.calls.lock().unwrap().push(rendered.clone());
        self.detached.lock().unwrap().push(rendered);
        Ok(Some(4242))
    }
}

fn temp_install_dir() -> PathBuf {
    std::env::temp_dir()
        .join(format!("tracker-install-{}", uuid::Uuid::new_v4()))
        .join("TeamTracker")
}

fn options(install_dir: PathBuf) -> InstallOptions {
    InstallOptions {
        install_dir,
        repository_url: "https://example.invalid/team-tracker.git".to_string(),
        service_url: "http://127.0.0.1:8000".to_string(),
        min_rust_version: ToolVersion::new(1, 85, 0),
        startup_delay: Duration::ZERO,
    }
}

async fn cleanup(install_dir: &std::path::Path) {
    if let Some(root) = install_dir.parent() {
        tokio::fs::remove_dir_all(root).await.ok();
    }
}

#[tokio::test]
async fn test_clone_failure_halts_pipeline() {
    let install_dir = temp_install_dir();
    let runner = Arc::new(
        FakeRunner::default().failing("git clone", "fatal: repository not found"),
    );

    let (mut ctx, rx) = InstallContext::new(options(install_dir.clone()), runner.clone());
    let failure = Pipeline::standard().run(&mut ctx).await.unwrap_err();

    assert_eq!(failure.stage, "CloneRepository");
    assert!(matches!(failure.error, InstallError::SourceFetch { .. }));
    assert_eq!(failure.error.output(), Some("fatal: repository not found"));

    let progress = rx.borrow().clone();
    assert_eq!(progress.percent, 20);
    assert!(progress.failed);
    assert!(!progress.finished);

    let calls = runner.calls();
    assert!(!calls.iter().any(|c| c.starts_with("cargo")));
    assert!(runner.detached().is_empty());
    assert!(!install_dir.join(".toolchain").exists());

    cleanup(&install_dir).await;
}

#[tokio::test]
async fn test_old_rust_fails_requirements() {
    struct OldRust(FakeRunner);

    #[async_trait]
    impl CommandRunner for OldRust {
        async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunError> {
            if spec.program == "rustc" {
                return Ok(CommandOutput {
                    code: Some(0),
                    stdout: "rustc 1.70.0 (90c541806 2023-05-31)".to_string(),
                    stderr: String::new(),
                });
            }
            self.0.run(spec).await
        }

        async fn run_streaming(
            &self,
            spec: &CommandSpec,
            on_line: &mut (dyn for<'a> FnMut(&'a str) + Send),
        ) -> Result<CommandOutput, RunError> {
            self.0.run_streaming(spec, on_line).await
        }

        fn spawn_detached(&self, spec: &CommandSpec) -> Result<Option<u32>, RunError> {
            self.0.spawn_detached(spec)
        }
    }

    let install_dir = temp_install_dir();
    let runner = Arc::new(OldRust(FakeRunner::default()));
    let (mut ctx, _rx) = InstallContext::new(options(install_dir.clone()), runner);

    let failure = Pipeline::standard().run(&mut ctx).await.unwrap_err();
    assert_eq!(failure.stage, "CheckRequirements");
    assert_eq!(
        failure.error,
        InstallError::Requirement("Rust 1.85.0 or newer is required, found 1.70.0".to_string())
    );
    assert!(!install_dir.exists());
}

#[tokio::test]
async fn test_static_asset_failure_is_not_fatal() {
    let install_dir = temp_install_dir();
    let runner = Arc::new(
        FakeRunner::default().failing("collect-static", "permission denied: static/"),
    );

    let (mut ctx, rx) = InstallContext::new(options(install_dir.clone()), runner.clone());
    let report = Pipeline::standard().run(&mut ctx).await.unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(report.warnings[0], InstallError::StaticAsset { .. }));
    assert_eq!(report.service_pid, Some(4242));

    let detached = runner.detached();
    assert_eq!(detached.len(), 2);
    assert!(detached[0].ends_with(" serve"));
    assert!(detached[1].ends_with("http://127.0.0.1:8000"));

    let progress = rx.borrow().clone();
    assert!(progress.finished);
    assert_eq!(progress.percent, 100);

    cleanup(&install_dir).await;
}

#[tokio::test]
async fn test_full_install_order_and_artifacts() {
    let install_dir = temp_install_dir();
    let runner = Arc::new(FakeRunner {
        build_lines: vec![
            "  Downloaded serde v1.0.228".to_string(),
            "   Compiling serde v1.0.228".to_string(),
            "    Finished `release` profile [optimized] target(s) in 42s".to_string(),
        ],
        ..FakeRunner::default()
    });

    let (mut ctx, mut rx) = InstallContext::new(options(install_dir.clone()), runner.clone());
    let watcher = tokio::spawn(async move {
        let mut statuses = Vec::new();
        while rx.changed().await.is_ok() {
            statuses.push(rx.borrow_and_update().status.clone());
        }
        statuses
    });

    let report = Pipeline::standard().run(&mut ctx).await.unwrap();
    drop(ctx);
    let statuses = watcher.await.unwrap();

    assert!(report.warnings.is_empty());
    assert_eq!(report.install_dir, install_dir);

    let calls = runner.calls();
    let order: Vec<&str> = calls
        .iter()
        .map(|c| {
            if c.starts_with("rustc") {
                "rustc"
            } else if c.starts_with("git --version") {
                "git-version"
            } else if c.starts_with("git clone") {
                "clone"
            } else if c == "cargo --version" {
                "cargo-probe"
            } else if c.starts_with("cargo build") {
                "build"
            } else if c.ends_with(" migrate") {
                "migrate"
            } else if c.ends_with(" collect-static") {
                "collect"
            } else if c.ends_with(" serve") {
                "serve"
            } else {
                "browser"
            }
        })
        .collect();
    assert_eq!(
        order,
        vec![
            "rustc",
            "git-version",
            "clone",
            "cargo-probe",
            "build",
            "migrate",
            "collect",
            "serve",
            "browser"
        ]
    );

    assert!(install_dir.join(".toolchain/cargo-home").is_dir());
    assert!(install_dir.join(".toolchain/target").is_dir());

    #[cfg(unix)]
    {
        let root = install_dir.parent().unwrap();
        assert_eq!(
            report.shortcuts,
            vec![root.join("run_tracker.sh"), root.join("uninstall_tracker.sh")]
        );
        assert!(root.join("run_tracker.sh").exists());
    }

    assert_eq!(
        statuses.last().map(String::as_str),
        Some("Installation complete!")
    );

    cleanup(&install_dir).await;
}
