use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{debug, info};

use super::error::InstallError;
use super::requirements::{ToolVersion, check_rust_version};
use super::runner::{CommandOutput, CommandSpec, RunError};
use super::shortcuts::{ScriptFlavor, write_scripts};
use super::InstallContext;

const TOOLCHAIN_DIR: &str = ".toolchain";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Completed,
    /// A process was started and deliberately left running.
    Launched { pid: Option<u32> },
}

#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    /// Progress shown while the stage runs.
    fn percent(&self) -> u8;

    fn status(&self) -> &'static str;

    fn halts_on_failure(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &mut InstallContext) -> Result<StageOutcome, InstallError>;
}

/// Stages in execution order.
#[must_use]
pub fn standard() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(CheckRequirements),
        Box::new(CreateDirectory),
        Box::new(CloneRepository),
        Box::new(CreateEnvironment),
        Box::new(InstallDependencies),
        Box::new(ApplySchema),
        Box::new(CollectStaticAssets),
        Box::new(StartService),
        Box::new(OpenInterface),
        Box::new(CreateShortcuts),
    ]
}

/// Path of the release binary inside a build target directory.
#[must_use]
pub fn release_binary(target_dir: &std::path::Path) -> PathBuf {
    target_dir
        .join("release")
        .join(format!("team-tracker{}", std::env::consts::EXE_SUFFIX))
}

fn binary_of(ctx: &InstallContext) -> PathBuf {
    ctx.binary.clone().unwrap_or_else(|| {
        release_binary(&ctx.options.install_dir.join(TOOLCHAIN_DIR).join("target"))
    })
}

/// Runs a short-lived command in the install directory with the build environment.
async fn run_in_install_dir(
    ctx: &InstallContext,
    program: impl Into<String>,
    args: &[&str],
) -> Result<CommandOutput, RunError> {
    let mut spec = CommandSpec::new(program)
        .current_dir(&ctx.options.install_dir)
        .envs(&ctx.env);
    for arg in args {
        spec = spec.arg(*arg);
    }
    ctx.runner().run(&spec).await
}

/// Collapses runner errors and non-zero exits into the captured text.
fn captured(result: Result<CommandOutput, RunError>) -> Result<CommandOutput, String> {
    match result {
        Ok(output) if output.success() => Ok(output),
        Ok(output) => {
            let text = output.diagnostics();
            Err(if text.is_empty() {
                format!("exited with status {:?}", output.code)
            } else {
                text
            })
        }
        Err(e) => Err(e.to_string()),
    }
}

pub struct CheckRequirements;

#[async_trait]
impl Stage for CheckRequirements {
    fn name(&self) -> &'static str {
        "CheckRequirements"
    }

    fn percent(&self) -> u8 {
        5
    }

    fn status(&self) -> &'static str {
        "Checking requirements..."
    }

    async fn run(&self, ctx: &mut InstallContext) -> Result<StageOutcome, InstallError> {
        let runner = ctx.runner();

        let rustc = captured(runner.run(&CommandSpec::new("rustc").arg("--version")).await)
            .map_err(|e| InstallError::Requirement(format!("Rust toolchain not available: {e}")))?;
        let rust_version = check_rust_version(&rustc.stdout, ctx.options.min_rust_version)
            .map_err(InstallError::Requirement)?;

        let git = captured(runner.run(&CommandSpec::new("git").arg("--version")).await)
            .map_err(|e| InstallError::Requirement(format!("Git not available: {e}")))?;
        let git_version = ToolVersion::find_in(&git.stdout);

        info!(
            "Found rustc {} and git {}",
            rust_version,
            git_version.map_or_else(|| "(unknown version)".to_string(), |v| v.to_string())
        );
        Ok(StageOutcome::Completed)
    }
}

pub struct CreateDirectory;

#[async_trait]
impl Stage for CreateDirectory {
    fn name(&self) -> &'static str {
        "CreateDirectory"
    }

    fn percent(&self) -> u8 {
        10
    }

    fn status(&self) -> &'static str {
        "Creating installation directory..."
    }

    async fn run(&self, ctx: &mut InstallContext) -> Result<StageOutcome, InstallError> {
        let dir = &ctx.options.install_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| InstallError::Filesystem(format!("{}: {e}", dir.display())))?;
        Ok(StageOutcome::Completed)
    }
}

pub struct CloneRepository;

#[async_trait]
impl Stage for CloneRepository {
    fn name(&self) -> &'static str {
        "CloneRepository"
    }

    fn percent(&self) -> u8 {
        20
    }

    fn status(&self) -> &'static str {
        "Cloning repository..."
    }

    async fn run(&self, ctx: &mut InstallContext) -> Result<StageOutcome, InstallError> {
        let url = ctx.options.repository_url.clone();
        captured(run_in_install_dir(ctx, "git", &["clone", url.as_str(), "."]).await)
            .map_err(|output| InstallError::SourceFetch { output })?;
        Ok(StageOutcome::Completed)
    }
}

/// Private `CARGO_HOME` and `CARGO_TARGET_DIR` under the install directory.
pub struct CreateEnvironment;

#[async_trait]
impl Stage for CreateEnvironment {
    fn name(&self) -> &'static str {
        "CreateEnvironment"
    }

    fn percent(&self) -> u8 {
        40
    }

    fn status(&self) -> &'static str {
        "Creating build environment..."
    }

    async fn run(&self, ctx: &mut InstallContext) -> Result<StageOutcome, InstallError> {
        let toolchain = ctx.options.install_dir.join(TOOLCHAIN_DIR);
        let cargo_home = toolchain.join("cargo-home");
        let target_dir = toolchain.join("target");

        for dir in [&cargo_home, &target_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| InstallError::Environment {
                    message: format!("{}: {e}", dir.display()),
                    output: String::new(),
                })?;
        }

        ctx.env = vec![
            (
                "CARGO_HOME".to_string(),
                cargo_home.to_string_lossy().into_owned(),
            ),
            (
                "CARGO_TARGET_DIR".to_string(),
                target_dir.to_string_lossy().into_owned(),
            ),
        ];

        let probe = captured(run_in_install_dir(ctx, "cargo", &["--version"]).await).map_err(
            |output| InstallError::Environment {
                message: "cargo is not usable in the isolated environment".to_string(),
                output,
            },
        )?;

        debug!("Build environment ready: {}", probe.stdout.trim());
        ctx.binary = Some(release_binary(&target_dir));
        Ok(StageOutcome::Completed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    Downloaded(String),
    Compiling(String),
    Finished,
}

impl BuildEvent {
    /// Recognizes the cargo status lines that drive progress.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"^\s*(Downloaded|Compiling|Finished)\b\s*(\S+)?")
                .expect("Invalid regex pattern defined in code")
        });

        let caps = re.captures(line)?;
        let krate = caps.get(2).map(|m| m.as_str().to_string());
        match &caps[1] {
            "Downloaded" => krate.map(Self::Downloaded),
            "Compiling" => krate.map(Self::Compiling),
            _ => Some(Self::Finished),
        }
    }

    #[must_use]
    pub fn progress(&self) -> (u8, String) {
        match self {
            Self::Downloaded(krate) => (60, format!("Collecting {krate}")),
            Self::Compiling(krate) => (65, format!("Installing {krate}")),
            Self::Finished => (70, "Dependencies installed".to_string()),
        }
    }
}

pub struct InstallDependencies;

#[async_trait]
impl Stage for InstallDependencies {
    fn name(&self) -> &'static str {
        "InstallDependencies"
    }

    fn percent(&self) -> u8 {
        60
    }

    fn status(&self) -> &'static str {
        "Installing dependencies..."
    }

    async fn run(&self, ctx: &mut InstallContext) -> Result<StageOutcome, InstallError> {
        let spec = CommandSpec::new("cargo")
            .arg("build")
            .arg("--release")
            .arg("--locked")
            .current_dir(&ctx.options.install_dir)
            .envs(&ctx.env);

        let runner = ctx.runner();
        let progress = ctx.progress();
        let mut on_line = |line: &str| {
            if let Some(event) = BuildEvent::parse(line) {
                let (percent, status) = event.progress();
                progress.send_modify(|p| {
                    p.percent = percent;
                    p.status = status;
                });
            }
        };

        captured(runner.run_streaming(&spec, &mut on_line).await)
            .map_err(|output| InstallError::Dependency { output })?;

        ctx.report(70, "Dependencies installed");
        Ok(StageOutcome::Completed)
    }
}

pub struct ApplySchema;

#[async_trait]
impl Stage for ApplySchema {
    fn name(&self) -> &'static str {
        "ApplySchema"
    }

    fn percent(&self) -> u8 {
        75
    }

    fn status(&self) -> &'static str {
        "Applying database schema..."
    }

    async fn run(&self, ctx: &mut InstallContext) -> Result<StageOutcome, InstallError> {
        let binary = binary_of(ctx).to_string_lossy().into_owned();
        captured(run_in_install_dir(ctx, binary, &["migrate"]).await)
            .map_err(|output| InstallError::Schema { output })?;
        Ok(StageOutcome::Completed)
    }
}

pub struct CollectStaticAssets;

#[async_trait]
impl Stage for CollectStaticAssets {
    fn name(&self) -> &'static str {
        "CollectStaticAssets"
    }

    fn percent(&self) -> u8 {
        85
    }

    fn status(&self) -> &'static str {
        "Collecting static files..."
    }

    fn halts_on_failure(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &mut InstallContext) -> Result<StageOutcome, InstallError> {
        let binary = binary_of(ctx).to_string_lossy().into_owned();
        captured(run_in_install_dir(ctx, binary, &["collect-static"]).await)
            .map_err(|output| InstallError::StaticAsset { output })?;
        Ok(StageOutcome::Completed)
    }
}

/// Launches the server and does not keep the child handle.
pub struct StartService;

#[async_trait]
impl Stage for StartService {
    fn name(&self) -> &'static str {
        "StartService"
    }

    fn percent(&self) -> u8 {
        95
    }

    fn status(&self) -> &'static str {
        "Starting server..."
    }

    async fn run(&self, ctx: &mut InstallContext) -> Result<StageOutcome, InstallError> {
        let spec = CommandSpec::new(binary_of(ctx).to_string_lossy())
            .arg("serve")
            .current_dir(&ctx.options.install_dir)
            .envs(&ctx.env);

        let pid = ctx
            .runner()
            .spawn_detached(&spec)
            .map_err(|e| InstallError::ServiceStart(e.to_string()))?;
        ctx.service_pid = pid;

        tokio::time::sleep(ctx.options.startup_delay).await;
        Ok(StageOutcome::Launched { pid })
    }
}

/// Platform command that hands `url` to the default browser.
#[must_use]
pub fn browser_command(url: &str) -> CommandSpec {
    if cfg!(windows) {
        CommandSpec::new("cmd").arg("/C").arg("start").arg("").arg(url)
    } else if cfg!(target_os = "macos") {
        CommandSpec::new("open").arg(url)
    } else {
        CommandSpec::new("xdg-open").arg(url)
    }
}

pub struct OpenInterface;

#[async_trait]
impl Stage for OpenInterface {
    fn name(&self) -> &'static str {
        "OpenInterface"
    }

    fn percent(&self) -> u8 {
        100
    }

    fn status(&self) -> &'static str {
        "Opening browser..."
    }

    fn halts_on_failure(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &mut InstallContext) -> Result<StageOutcome, InstallError> {
        let spec = browser_command(&ctx.options.service_url);
        let pid = ctx
            .runner()
            .spawn_detached(&spec)
            .map_err(|e| InstallError::Browser(e.to_string()))?;
        Ok(StageOutcome::Launched { pid })
    }
}

pub struct CreateShortcuts;

#[async_trait]
impl Stage for CreateShortcuts {
    fn name(&self) -> &'static str {
        "CreateShortcuts"
    }

    fn percent(&self) -> u8 {
        100
    }

    fn status(&self) -> &'static str {
        "Creating shortcuts..."
    }

    fn halts_on_failure(&self) -> bool {
        false
    }

    async fn run(&self, ctx: &mut InstallContext) -> Result<StageOutcome, InstallError> {
        let binary = binary_of(ctx);
        ctx.shortcuts =
            write_scripts(ScriptFlavor::current(), &ctx.options.install_dir, &binary).await?;
        Ok(StageOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cargo_status_lines_drive_progress() {
        assert_eq!(
            BuildEvent::parse("  Downloaded serde v1.0.228"),
            Some(BuildEvent::Downloaded("serde".to_string()))
        );
        assert_eq!(
            BuildEvent::parse("   Compiling tokio v1.49.0"),
            Some(BuildEvent::Compiling("tokio".to_string()))
        );
        assert_eq!(
            BuildEvent::parse("    Finished `release` profile [optimized] target(s) in 2m 01s"),
            Some(BuildEvent::Finished)
        );
        assert_eq!(BuildEvent::parse("warning: unused import"), None);
        assert_eq!(BuildEvent::parse("   Updating crates.io index"), None);
    }

    #[test]
    fn build_events_map_to_fixed_percentages() {
        assert_eq!(
            BuildEvent::Downloaded("rand".into()).progress(),
            (60, "Collecting rand".to_string())
        );
        assert_eq!(
            BuildEvent::Compiling("rand".into()).progress(),
            (65, "Installing rand".to_string())
        );
        assert_eq!(BuildEvent::Finished.progress().0, 70);
    }

    #[test]
    fn release_binary_lives_under_target() {
        let binary = release_binary(std::path::Path::new("/srv/tt/.toolchain/target"));
        assert!(binary.starts_with("/srv/tt/.toolchain/target/release"));
        assert!(
            binary
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("team-tracker")
        );
    }

    #[test]
    fn non_zero_exit_keeps_diagnostics() {
        let failed = CommandOutput {
            code: Some(128),
            stdout: String::new(),
            stderr: "fatal: destination path '.' already exists".to_string(),
        };
        assert_eq!(
            captured(Ok(failed)).unwrap_err(),
            "fatal: destination path '.' already exists"
        );
        assert_eq!(
            captured(Err(RunError::TimedOut)).unwrap_err(),
            "Command timed out"
        );
    }
}
