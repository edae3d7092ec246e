use super::members::short_date;
use super::open_tracker;
use crate::config::Config;
use crate::db::TaskFilter;
use crate::models::task::TaskUpdate;
use crate::services::{TaskDraft, TrackerError, TrackerService};

pub struct TaskNew {
    pub reg_number: String,
    pub title: String,
    pub description: Option<String>,
    pub credits: u32,
    pub due: Option<String>,
    pub completed: bool,
}

pub struct TaskListArgs {
    pub member: Option<String>,
    pub completed: Option<bool>,
    pub limit: Option<u64>,
}

pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub clear_description: bool,
    pub credits: Option<u32>,
    pub due: Option<String>,
    pub clear_due: bool,
}

impl TaskEdit {
    fn into_update(self) -> TaskUpdate {
        TaskUpdate {
            title: self.title,
            description: if self.clear_description {
                Some(None)
            } else {
                self.description.map(Some)
            },
            credits: self.credits,
            is_completed: None,
            due_date: if self.clear_due {
                Some(None)
            } else {
                self.due.map(Some)
            },
        }
    }
}

pub async fn cmd_task_add(config: &Config, args: TaskNew) -> anyhow::Result<()> {
    let tracker = open_tracker(config).await?;

    let task = tracker
        .create_task(
            &args.reg_number,
            TaskDraft {
                title: args.title,
                description: args.description,
                credits: args.credits,
                is_completed: args.completed,
                due_date: args.due,
            },
        )
        .await?;

    println!(
        "✓ Added task #{}: {} ({} credits)",
        task.id, task.title, task.credits
    );
    Ok(())
}

pub async fn cmd_task_list(config: &Config, args: TaskListArgs) -> anyhow::Result<()> {
    let tracker = open_tracker(config).await?;

    let member_id = match args.member.as_deref() {
        Some(reg_number) => match tracker.member_detail(reg_number).await {
            Ok(detail) => Some(detail.member.id),
            Err(TrackerError::NotFound(msg)) => {
                println!("{msg}");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        },
        None => None,
    };

    let tasks = tracker
        .list_tasks(TaskFilter {
            member_id,
            completed: args.completed,
            limit: args.limit,
        })
        .await?;

    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    println!("Tasks ({} shown)", tasks.len());
    println!("{:-<70}", "");

    for entry in &tasks {
        let task = &entry.task;
        let marker = if task.is_completed { "✓" } else { "⏳" };
        println!("{} #{} {}", marker, task.id, task.title);
        println!(
            "  Owner: {} [{}] | Credits: {} | Created: {}{}",
            entry.member_name,
            entry.member_reg_number,
            task.credits,
            short_date(&task.created_at),
            task.due_date
                .as_deref()
                .map(|d| format!(" | Due: {}", short_date(d)))
                .unwrap_or_default()
        );
    }

    println!();
    println!("Legend: ✓ Completed | ⏳ Pending");
    Ok(())
}

pub async fn cmd_task_set_completion(
    config: &Config,
    id: i32,
    completed: bool,
) -> anyhow::Result<()> {
    let tracker = open_tracker(config).await?;
    let task = tracker.set_task_completion(id, completed).await?;

    if task.is_completed {
        println!("✓ Completed #{}: {} (+{} credits)", task.id, task.title, task.credits);
    } else {
        println!("⏳ Reopened #{}: {}", task.id, task.title);
    }
    Ok(())
}

pub async fn cmd_task_edit(config: &Config, id: i32, edit: TaskEdit) -> anyhow::Result<()> {
    let update = edit.into_update();
    if update.is_empty() {
        println!("Nothing to change. See 'team-tracker task edit --help'.");
        return Ok(());
    }

    let tracker = open_tracker(config).await?;
    let task = tracker.update_task(id, update).await?;

    println!("✓ Updated task #{}: {}", task.id, task.title);
    Ok(())
}

pub async fn cmd_task_remove(config: &Config, id: i32) -> anyhow::Result<()> {
    let tracker = open_tracker(config).await?;

    match tracker.delete_task(id).await {
        Ok(()) => println!("✓ Removed task #{id}"),
        Err(TrackerError::NotFound(msg)) => println!("{msg}"),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_flags_become_explicit_nulls() {
        let update = TaskEdit {
            title: None,
            description: Some("ignored".to_string()),
            clear_description: true,
            credits: Some(30),
            due: None,
            clear_due: true,
        }
        .into_update();

        assert_eq!(update.description, Some(None));
        assert_eq!(update.due_date, Some(None));
        assert_eq!(update.credits, Some(30));
        assert!(update.title.is_none());
    }

    #[test]
    fn untouched_fields_stay_unset() {
        let update = TaskEdit {
            title: None,
            description: None,
            clear_description: false,
            credits: None,
            due: None,
            clear_due: false,
        }
        .into_update();

        assert!(update.is_empty());
    }
}
