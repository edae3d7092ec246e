use super::members::short_date;
use super::open_tracker;
use crate::config::Config;
use crate::services::{RankedMember, TrackerService};

fn print_ranked(entry: &RankedMember) {
    println!(
        "{:>3}. {:<24} {:>6} credits | {}/{} tasks | {:.1}%",
        entry.rank,
        entry.member.name,
        entry.total_credits,
        entry.completed_tasks,
        entry.total_tasks,
        entry.completion_rate
    );
}

pub async fn cmd_dashboard(config: &Config) -> anyhow::Result<()> {
    let tracker = open_tracker(config).await?;
    let summary = tracker.dashboard().await?;

    println!("Team Dashboard");
    println!("{:-<70}", "");
    println!(
        "Members: {} | Tasks: {} ({} completed) | Credits: {} | Completion: {:.1}%",
        summary.total_members,
        summary.total_tasks,
        summary.completed_tasks,
        summary.total_credits,
        summary.completion_rate
    );

    if !summary.top_performers.is_empty() {
        println!();
        println!("Top Performers:");
        for entry in &summary.top_performers {
            print_ranked(entry);
        }
    }

    if !summary.recent_members.is_empty() {
        println!();
        println!("Recent Members:");
        for member in &summary.recent_members {
            println!("  • {} (joined {})", member, short_date(&member.created_at));
        }
    }

    if !summary.recent_tasks.is_empty() {
        println!();
        println!("Recent Tasks:");
        for entry in &summary.recent_tasks {
            let marker = if entry.task.is_completed { "✓" } else { "⏳" };
            println!(
                "  {} {} [{}] {} credits",
                marker, entry.task.title, entry.member_reg_number, entry.task.credits
            );
        }
    }

    Ok(())
}

pub async fn cmd_leaderboard(config: &Config) -> anyhow::Result<()> {
    let tracker = open_tracker(config).await?;
    let board = tracker.leaderboard().await?;

    if board.members.is_empty() {
        println!("No members yet. Run 'team-tracker seed' for sample data.");
        return Ok(());
    }

    println!("Leaderboard");
    println!("{:-<70}", "");

    let places = [
        ("🥇", &board.podium.first_place),
        ("🥈", &board.podium.second_place),
        ("🥉", &board.podium.third_place),
    ];
    for (medal, place) in places {
        if let Some(entry) = place {
            println!("{} {} - {} credits", medal, entry.member, entry.total_credits);
        }
    }

    println!();
    for entry in &board.members {
        print_ranked(entry);
    }

    Ok(())
}
