pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod installer;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, MemberCommands, TaskCommands};
pub use config::Config;

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let (layer, task) = tracing_loki::builder()
            .label("app", "team-tracker")?
            .extra_field("env", "production")?
            .build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    Ok(())
}

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Init)) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("config.toml already exists, leaving it untouched.");
        }
        return Ok(());
    }

    let config = Config::load()?;
    config.validate()?;

    init_tracing(&config)?;

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Serve => {
            let prometheus_handle = if config.observability.metrics_enabled {
                use metrics_exporter_prometheus::PrometheusBuilder;
                let handle = PrometheusBuilder::new()
                    .install_recorder()
                    .context("Failed to install Prometheus recorder")?;
                info!("Prometheus metrics recorder initialized");
                Some(handle)
            } else {
                None
            };
            cli::cmd_serve(config, prometheus_handle).await
        }

        Commands::Migrate => cli::cmd_migrate(&config).await,

        Commands::CollectStatic { out } => cli::cmd_collect_static(&out).await,

        Commands::Seed { seed } => cli::cmd_seed(&config, seed).await,

        Commands::Member { command } => match command {
            MemberCommands::Add {
                name,
                reg_number,
                email,
            } => cli::cmd_member_add(&config, &name, &reg_number, &email).await,
            MemberCommands::List => cli::cmd_member_list(&config).await,
            MemberCommands::Show { reg_number } => cli::cmd_member_show(&config, &reg_number).await,
            MemberCommands::Edit {
                reg_number,
                name,
                email,
            } => cli::cmd_member_edit(&config, &reg_number, name, email).await,
            MemberCommands::Remove { reg_number, yes } => {
                cli::cmd_member_remove(&config, &reg_number, yes).await
            }
            MemberCommands::Search { query } => cli::cmd_member_search(&config, &query).await,
        },

        Commands::Task { command } => match command {
            TaskCommands::Add {
                reg_number,
                title,
                description,
                credits,
                due,
                completed,
            } => {
                cli::cmd_task_add(
                    &config,
                    cli::TaskNew {
                        reg_number,
                        title,
                        description,
                        credits,
                        due,
                        completed,
                    },
                )
                .await
            }
            TaskCommands::List {
                member,
                completed,
                pending,
                limit,
            } => {
                let completed = match (completed, pending) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                };
                cli::cmd_task_list(
                    &config,
                    cli::TaskListArgs {
                        member,
                        completed,
                        limit,
                    },
                )
                .await
            }
            TaskCommands::Complete { id } => cli::cmd_task_set_completion(&config, id, true).await,
            TaskCommands::Reopen { id } => cli::cmd_task_set_completion(&config, id, false).await,
            TaskCommands::Edit {
                id,
                title,
                description,
                clear_description,
                credits,
                due,
                clear_due,
            } => {
                cli::cmd_task_edit(
                    &config,
                    id,
                    cli::TaskEdit {
                        title,
                        description,
                        clear_description,
                        credits,
                        due,
                        clear_due,
                    },
                )
                .await
            }
            TaskCommands::Remove { id } => cli::cmd_task_remove(&config, id).await,
        },

        Commands::Dashboard => cli::cmd_dashboard(&config).await,

        Commands::Leaderboard => cli::cmd_leaderboard(&config).await,

        Commands::Install { path, console } => cli::cmd_install(&config, path, console).await,

        Commands::Init => Ok(()),
    }
}
