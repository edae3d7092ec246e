mod install;
mod maintenance;
mod members;
mod reports;
mod serve;
mod tasks;

pub use install::cmd_install;
pub use maintenance::{cmd_collect_static, cmd_migrate, cmd_seed};
pub use members::{
    cmd_member_add, cmd_member_edit, cmd_member_list, cmd_member_remove, cmd_member_search,
    cmd_member_show,
};
pub use reports::{cmd_dashboard, cmd_leaderboard};
pub use serve::cmd_serve;
pub use tasks::{
    TaskEdit, TaskListArgs, TaskNew, cmd_task_add, cmd_task_edit, cmd_task_list, cmd_task_remove,
    cmd_task_set_completion,
};

use crate::config::Config;
use crate::db::Store;
use crate::services::SeaOrmTrackerService;

async fn open_tracker(config: &Config) -> anyhow::Result<SeaOrmTrackerService> {
    let store = Store::new(&config.general.database_path).await?;
    Ok(SeaOrmTrackerService::new(store))
}

/// Asks a yes/no question on stdin. Anything but `y` means no.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    println!("{prompt}");
    println!("Enter 'y' to confirm, anything else to cancel:");

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
