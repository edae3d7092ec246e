use super::{confirm, open_tracker};
use crate::config::Config;
use crate::models::member::{Member, MemberUpdate, NewMember};
use crate::services::{TrackerError, TrackerService};

fn print_member_row(member: &Member) {
    println!("• {} [{}]", member.name, member.reg_number);
    println!("  Email: {} | Joined: {}", member.email, short_date(&member.created_at));
}

pub(super) fn short_date(timestamp: &str) -> &str {
    timestamp.get(..10).unwrap_or(timestamp)
}

pub async fn cmd_member_add(
    config: &Config,
    name: &str,
    reg_number: &str,
    email: &str,
) -> anyhow::Result<()> {
    let tracker = open_tracker(config).await?;

    let member = tracker
        .create_member(NewMember {
            name: name.to_string(),
            reg_number: reg_number.to_string(),
            email: email.to_string(),
        })
        .await?;

    println!("✓ Added member: {member}");
    Ok(())
}

pub async fn cmd_member_list(config: &Config) -> anyhow::Result<()> {
    let tracker = open_tracker(config).await?;
    let members = tracker.list_members().await?;

    if members.is_empty() {
        println!("No members yet.");
        println!();
        println!("Add one with: team-tracker member add \"Name\" REG001 name@example.com");
        return Ok(());
    }

    println!("Members ({} total)", members.len());
    println!("{:-<70}", "");
    for member in &members {
        print_member_row(member);
    }

    Ok(())
}

pub async fn cmd_member_show(config: &Config, reg_number: &str) -> anyhow::Result<()> {
    let tracker = open_tracker(config).await?;

    let detail = match tracker.member_detail(reg_number).await {
        Ok(detail) => detail,
        Err(TrackerError::NotFound(msg)) => {
            println!("{msg}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let member = &detail.member;
    println!("{}", member.name);
    println!("{:-<70}", "");
    println!("Registration: {}", member.reg_number);
    println!("Email:        {}", member.email);
    println!("Joined:       {}", short_date(&member.created_at));
    println!();
    println!(
        "Credits: {} | Tasks: {} ({} done, {} pending) | Completion: {:.1}%",
        detail.total_credits,
        detail.tasks.len(),
        detail.completed_tasks.len(),
        detail.pending_tasks.len(),
        detail.completion_rate
    );

    if !detail.tasks.is_empty() {
        println!();
        for task in &detail.tasks {
            let marker = if task.is_completed { "✓" } else { "⏳" };
            let due = task
                .due_date
                .as_deref()
                .map(|d| format!(" | due {}", short_date(d)))
                .unwrap_or_default();
            println!(
                "  {} #{} {} ({} credits{})",
                marker, task.id, task.title, task.credits, due
            );
        }
    }

    Ok(())
}

pub async fn cmd_member_edit(
    config: &Config,
    reg_number: &str,
    name: Option<String>,
    email: Option<String>,
) -> anyhow::Result<()> {
    let update = MemberUpdate { name, email };
    if update.is_empty() {
        println!("Nothing to change. Use --name and/or --email.");
        return Ok(());
    }

    let tracker = open_tracker(config).await?;
    let member = tracker.update_member(reg_number, update).await?;

    println!("✓ Updated member: {member} <{}>", member.email);
    Ok(())
}

pub async fn cmd_member_remove(config: &Config, reg_number: &str, yes: bool) -> anyhow::Result<()> {
    let tracker = open_tracker(config).await?;

    let detail = match tracker.member_detail(reg_number).await {
        Ok(detail) => detail,
        Err(TrackerError::NotFound(msg)) => {
            println!("{msg}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let prompt = format!(
        "Remove {} and their {} task(s)?",
        detail.member,
        detail.tasks.len()
    );
    if !yes && !confirm(&prompt)? {
        println!("Cancelled.");
        return Ok(());
    }

    tracker.delete_member(reg_number).await?;
    println!("✓ Removed: {}", detail.member);
    Ok(())
}

pub async fn cmd_member_search(config: &Config, query: &str) -> anyhow::Result<()> {
    let tracker = open_tracker(config).await?;
    let members = tracker.search_members(query).await?;

    if members.is_empty() {
        println!("No members match '{query}'");
        return Ok(());
    }

    println!("Members matching '{}' ({})", query, members.len());
    println!("{:-<70}", "");
    for member in &members {
        print_member_row(member);
    }

    Ok(())
}
