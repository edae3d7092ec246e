//! Domain service for members, tasks and their credit standings.
//!
//! Read views are recomputed from the stored rows on every call; nothing
//! derived is persisted.

use crate::db::TaskFilter;
use crate::models::member::{Member, MemberUpdate, NewMember};
use crate::models::task::{Task, TaskUpdate};
use crate::services::ranking::{Podium, RankedMember};
use serde::Serialize;
use thiserror::Error;

/// Errors specific to tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl TrackerError {
    pub fn member_not_found(reg_number: &str) -> Self {
        Self::NotFound(format!("Member '{reg_number}' not found"))
    }

    #[must_use]
    pub fn task_not_found(id: i32) -> Self {
        Self::NotFound(format!("Task {id} not found"))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<sea_orm::DbErr> for TrackerError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for TrackerError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// A task plus the name and registration number of its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskWithOwner {
    #[serde(flatten)]
    pub task: Task,
    pub member_name: String,
    pub member_reg_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_members: u64,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub total_credits: i64,
    pub completion_rate: f64,
    pub recent_members: Vec<Member>,
    pub recent_tasks: Vec<TaskWithOwner>,
    pub top_performers: Vec<RankedMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberRankings {
    pub members: Vec<RankedMember>,
    pub total_members: usize,
    pub top_performer: Option<RankedMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberDetail {
    pub member: Member,
    pub tasks: Vec<Task>,
    pub completed_tasks: Vec<Task>,
    pub pending_tasks: Vec<Task>,
    pub total_credits: i64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboard {
    pub members: Vec<RankedMember>,
    #[serde(flatten)]
    pub podium: Podium,
}

/// Input for a new task, addressed to a member by registration number.
#[derive(Debug, Clone, Default)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub credits: u32,
    pub is_completed: bool,
    pub due_date: Option<String>,
}

/// Domain service trait for tracker operations.
#[async_trait::async_trait]
pub trait TrackerService: Send + Sync {
    /// Global counters, recent activity and the top five members.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Database`] on connection failures.
    async fn dashboard(&self) -> Result<DashboardSummary, TrackerError>;

    /// Every member with derived statistics, best first.
    async fn member_rankings(&self) -> Result<MemberRankings, TrackerError>;

    /// Tasks of one member split into completed and pending.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] if no member has `reg_number`.
    async fn member_detail(&self, reg_number: &str) -> Result<MemberDetail, TrackerError>;

    /// Full ranking plus the first three places.
    async fn leaderboard(&self) -> Result<Leaderboard, TrackerError>;

    /// # Errors
    ///
    /// Returns [`TrackerError::Conflict`] if the registration number or
    /// email is already taken.
    async fn create_member(&self, member: NewMember) -> Result<Member, TrackerError>;

    async fn update_member(
        &self,
        reg_number: &str,
        update: MemberUpdate,
    ) -> Result<Member, TrackerError>;

    /// Removes the member and all of its tasks.
    async fn delete_member(&self, reg_number: &str) -> Result<(), TrackerError>;

    /// Alphabetical by name.
    async fn list_members(&self) -> Result<Vec<Member>, TrackerError>;

    async fn search_members(&self, query: &str) -> Result<Vec<Member>, TrackerError>;

    async fn create_task(&self, reg_number: &str, draft: TaskDraft) -> Result<Task, TrackerError>;

    async fn update_task(&self, id: i32, update: TaskUpdate) -> Result<Task, TrackerError>;

    async fn set_task_completion(&self, id: i32, completed: bool) -> Result<Task, TrackerError>;

    async fn delete_task(&self, id: i32) -> Result<(), TrackerError>;

    /// Newest first.
    async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<TaskWithOwner>, TrackerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_error_display() {
        let err = TrackerError::member_not_found("REG404");
        assert_eq!(err.to_string(), "Not found: Member 'REG404' not found");

        let err = TrackerError::validation("Name cannot be empty");
        assert_eq!(err.to_string(), "Validation error: Name cannot be empty");
    }

    #[test]
    fn db_errors_convert_to_database_variant() {
        let db_err = sea_orm::DbErr::Custom("boom".to_string());
        let err: TrackerError = db_err.into();
        assert!(matches!(err, TrackerError::Database(_)));
    }
}
