use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::warn;

use crate::config::Config;
use crate::installer::{
    CommandRunner, InstallContext, InstallFailure, InstallOptions, InstallProgress, InstallReport,
    Pipeline, SystemRunner,
};

const BAR_WIDTH: usize = 30;

fn render_bar(progress: &InstallProgress) -> String {
    let filled = usize::from(progress.percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}% {}",
        "#".repeat(filled),
        " ".repeat(BAR_WIDTH - filled),
        progress.percent,
        progress.status
    )
}

async fn follow_progress(mut rx: watch::Receiver<InstallProgress>) {
    let mut last_len: usize = 0;
    loop {
        let line = render_bar(&rx.borrow_and_update());
        let padding = " ".repeat(last_len.saturating_sub(line.chars().count()));
        print!("\r{line}{padding}");
        std::io::stdout().flush().ok();
        last_len = line.chars().count();

        if rx.changed().await.is_err() {
            break;
        }
    }
    println!();
}

fn print_failure(failure: &InstallFailure) {
    println!();
    println!("{:=<70}", "");
    println!("  Installation failed at {}", failure.stage);
    println!("{:=<70}", "");
    println!("{}", failure.error);

    if let Some(output) = failure.error.output() {
        println!();
        println!("Command output:");
        println!("{:-<70}", "");
        println!("{}", output.trim_end());
        println!("{:-<70}", "");
    }
    println!();
}

fn print_report(report: &InstallReport) {
    println!();
    println!("✓ Team Tracker installed in {}", report.install_dir.display());
    println!("  Running at {}", report.service_url);

    if !report.shortcuts.is_empty() {
        println!();
        println!("Scripts:");
        for path in &report.shortcuts {
            println!("  • {}", path.display());
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("Completed with warnings:");
        for warning in &report.warnings {
            println!("  ⚠ {warning}");
            if let Some(output) = warning.output() {
                for line in output.lines().take(5) {
                    println!("      {line}");
                }
            }
        }
    }
}

async fn install_once(
    options: InstallOptions,
    runner: Arc<dyn CommandRunner>,
) -> anyhow::Result<Result<InstallReport, InstallFailure>> {
    let (mut ctx, rx) = InstallContext::new(options, runner);

    let pipeline_task =
        tokio::spawn(async move { Pipeline::standard().run(&mut ctx).await });

    follow_progress(rx).await;
    Ok(pipeline_task.await?)
}

pub async fn cmd_install(
    config: &Config,
    path: Option<PathBuf>,
    console: bool,
) -> anyhow::Result<()> {
    if console {
        println!("Console installer is not available yet. Run 'team-tracker install' instead.");
        return Ok(());
    }

    let options = InstallOptions::from_config(config, path)?;
    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new(Duration::from_secs(
        config.installer.command_timeout_seconds,
    )));

    println!("Team Tracker Installer");
    println!("{:-<70}", "");
    println!("Repository: {}", options.repository_url);
    println!("Target:     {}", options.install_dir.display());
    println!();

    loop {
        match install_once(options.clone(), Arc::clone(&runner)).await? {
            Ok(report) => {
                print_report(&report);
                return Ok(());
            }
            Err(failure) => {
                warn!("Installation failed: {}", failure);
                print_failure(&failure);

                print!("Retry installation from the beginning? [y/N]: ");
                std::io::stdout().flush().ok();
                let mut input = String::new();
                std::io::stdin().read_line(&mut input)?;

                if !input.trim().eq_ignore_ascii_case("y") {
                    anyhow::bail!(failure);
                }
                println!();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bar_scales_with_percent() {
        let progress = InstallProgress {
            percent: 50,
            status: "Installing tokio".to_string(),
            ..InstallProgress::default()
        };
        let bar = render_bar(&progress);
        assert!(bar.starts_with(&format!("[{}{}]", "#".repeat(15), " ".repeat(15))));
        assert!(bar.ends_with(" 50% Installing tokio"));

        let done = InstallProgress {
            percent: 100,
            ..InstallProgress::default()
        };
        assert!(render_bar(&done).starts_with(&format!("[{}]", "#".repeat(BAR_WIDTH))));
    }
}
