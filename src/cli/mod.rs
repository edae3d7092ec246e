//! CLI module - Command-line interface for Team Tracker
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Team Tracker - members, tasks and credit leaderboards
#[derive(Parser)]
#[command(name = "team-tracker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    #[command(alias = "runserver")]
    Serve,

    /// Apply pending database migrations
    Migrate,

    /// Export embedded static assets to a directory
    CollectStatic {
        /// Target directory
        #[arg(long, default_value = "static")]
        out: PathBuf,
    },

    /// Replace all data with randomized sample members and tasks
    Seed {
        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Manage members
    Member {
        #[command(subcommand)]
        command: MemberCommands,
    },

    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Show team-wide statistics
    Dashboard,

    /// Show the credit leaderboard
    #[command(alias = "lb")]
    Leaderboard,

    /// Install, build and launch the tracker from its repository
    Install {
        /// Installation directory (default: ~/TeamTracker)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Print a placeholder message and exit
        #[arg(long)]
        console: bool,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

#[derive(Subcommand)]
pub enum MemberCommands {
    /// Add a member
    Add {
        name: String,
        reg_number: String,
        email: String,
    },
    /// List members alphabetically
    #[command(alias = "ls")]
    List,
    /// Show a member with its tasks
    Show { reg_number: String },
    /// Change a member's name or email
    Edit {
        reg_number: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Remove a member and all of its tasks
    #[command(alias = "rm")]
    Remove {
        reg_number: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Search by name, registration number or email
    Search { query: String },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Assign a task to a member
    Add {
        reg_number: String,
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, default_value_t = 0)]
        credits: u32,
        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,
        /// Create the task already completed
        #[arg(long)]
        completed: bool,
    },
    /// List tasks, newest first
    #[command(alias = "ls")]
    List {
        /// Only tasks of this member
        #[arg(long)]
        member: Option<String>,
        #[arg(long, conflicts_with = "pending")]
        completed: bool,
        #[arg(long)]
        pending: bool,
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Mark a task as completed
    #[command(alias = "done")]
    Complete { id: i32 },
    /// Mark a task as pending again
    Reopen { id: i32 },
    /// Change task fields
    Edit {
        id: i32,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Remove the description
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
        #[arg(long)]
        credits: Option<u32>,
        #[arg(long)]
        due: Option<String>,
        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
    },
    /// Delete a task
    #[command(alias = "rm")]
    Remove { id: i32 },
}

pub use commands::*;
