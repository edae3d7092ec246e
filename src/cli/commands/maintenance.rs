use rand::SeedableRng;
use rand::rngs::StdRng;
use sea_orm_migration::MigratorTrait;
use std::path::Path;

use crate::api::assets;
use crate::config::Config;
use crate::db::{Store, migrator::Migrator};
use crate::services::generate_sample_data;

pub async fn cmd_migrate(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let applied = Migrator::get_applied_migrations(&store.conn).await?;

    println!(
        "✓ Database schema is up to date ({} migrations applied)",
        applied.len()
    );
    Ok(())
}

pub async fn cmd_collect_static(out: &Path) -> anyhow::Result<()> {
    let written = assets::collect_static(out).await?;
    println!("✓ Collected {} static files into {}", written, out.display());
    Ok(())
}

pub async fn cmd_seed(config: &Config, seed: Option<u64>) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let mut rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

    println!("Replacing all members and tasks with sample data...");
    let summary = generate_sample_data(&store, &mut rng).await?;

    println!(
        "✓ Created {} members and {} tasks ({} completed)",
        summary.members, summary.tasks, summary.completed
    );
    Ok(())
}
