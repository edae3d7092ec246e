//! Provisioning pipeline that turns a bare machine into a running tracker.
//!
//! The pipeline runs its stages in order and publishes an [`InstallProgress`]
//! snapshot on a `watch` channel after every step. The first halting error
//! stops it; non-halting errors are collected into the [`InstallReport`].

pub mod error;
pub mod requirements;
pub mod runner;
pub mod shortcuts;
pub mod stages;

pub use error::InstallError;
pub use runner::{CommandOutput, CommandRunner, CommandSpec, RunError, SystemRunner};
pub use stages::{Stage, StageOutcome};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::Config;
use requirements::ToolVersion;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallProgress {
    pub percent: u8,
    pub status: String,
    pub stage: Option<&'static str>,
    pub finished: bool,
    pub failed: bool,
}

/// Everything the stages need to know up front.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub install_dir: PathBuf,
    pub repository_url: String,
    pub service_url: String,
    pub min_rust_version: ToolVersion,
    pub startup_delay: Duration,
}

impl InstallOptions {
    pub fn from_config(config: &Config, install_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let installer = &config.installer;
        let min_rust_version = installer
            .min_rust_version
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;

        Ok(Self {
            install_dir: install_dir.unwrap_or_else(|| installer.resolved_install_path()),
            repository_url: installer.repository_url.clone(),
            service_url: config.server.public_url(),
            min_rust_version,
            startup_delay: Duration::from_secs(installer.startup_delay_seconds),
        })
    }
}

/// Mutable state threaded through the stages.
pub struct InstallContext {
    pub options: InstallOptions,
    /// Extra environment for every command after the build environment exists.
    pub env: Vec<(String, String)>,
    /// Release binary produced by the dependency stage.
    pub binary: Option<PathBuf>,
    pub service_pid: Option<u32>,
    pub shortcuts: Vec<PathBuf>,
    pub warnings: Vec<InstallError>,
    runner: Arc<dyn CommandRunner>,
    progress: watch::Sender<InstallProgress>,
}

impl InstallContext {
    #[must_use]
    pub fn new(
        options: InstallOptions,
        runner: Arc<dyn CommandRunner>,
    ) -> (Self, watch::Receiver<InstallProgress>) {
        let (progress, rx) = watch::channel(InstallProgress::default());
        (
            Self {
                options,
                env: Vec::new(),
                binary: None,
                service_pid: None,
                shortcuts: Vec::new(),
                warnings: Vec::new(),
                runner,
                progress,
            },
            rx,
        )
    }

    #[must_use]
    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        Arc::clone(&self.runner)
    }

    #[must_use]
    pub const fn progress(&self) -> &watch::Sender<InstallProgress> {
        &self.progress
    }

    /// Sets percent and status text, keeping the current stage.
    pub fn report(&self, percent: u8, status: impl Into<String>) {
        let status = status.into();
        self.progress.send_modify(|p| {
            p.percent = percent;
            p.status = status;
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub install_dir: PathBuf,
    pub service_url: String,
    pub service_pid: Option<u32>,
    pub shortcuts: Vec<PathBuf>,
    pub warnings: Vec<InstallError>,
}

#[derive(Debug, Error)]
#[error("{stage} failed: {error}")]
pub struct InstallFailure {
    pub stage: &'static str,
    pub error: InstallError,
    /// Non-halting problems seen before the failure.
    pub warnings: Vec<InstallError>,
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    #[must_use]
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// The full provisioning sequence.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(stages::standard())
    }

    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, ctx: &mut InstallContext) -> Result<InstallReport, InstallFailure> {
        info!(
            "Installing into {} from {}",
            ctx.options.install_dir.display(),
            ctx.options.repository_url
        );

        for stage in &self.stages {
            ctx.progress.send_modify(|p| {
                p.percent = stage.percent();
                p.status = stage.status().to_string();
                p.stage = Some(stage.name());
            });

            match stage.run(ctx).await {
                Ok(StageOutcome::Completed) => {
                    info!("Stage {} completed", stage.name());
                }
                Ok(StageOutcome::Launched { pid }) => {
                    info!("Stage {} launched process {:?}", stage.name(), pid);
                }
                Err(error) if stage.halts_on_failure() => {
                    warn!("Stage {} failed: {}", stage.name(), error);
                    ctx.progress.send_modify(|p| {
                        p.status = error.to_string();
                        p.failed = true;
                    });
                    return Err(InstallFailure {
                        stage: stage.name(),
                        error,
                        warnings: std::mem::take(&mut ctx.warnings),
                    });
                }
                Err(error) => {
                    warn!("Stage {} failed, continuing: {}", stage.name(), error);
                    ctx.warnings.push(error);
                }
            }
        }

        ctx.progress.send_modify(|p| {
            p.percent = 100;
            p.status = "Installation complete!".to_string();
            p.finished = true;
        });

        Ok(InstallReport {
            install_dir: ctx.options.install_dir.clone(),
            service_url: ctx.options.service_url.clone(),
            service_pid: ctx.service_pid,
            shortcuts: std::mem::take(&mut ctx.shortcuts),
            warnings: std::mem::take(&mut ctx.warnings),
        })
    }
}
