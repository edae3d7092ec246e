//! `SeaORM` implementation of the `TrackerService` trait.

use crate::db::{Store, TaskFilter};
use crate::models::member::{Member, MemberUpdate, NewMember};
use crate::models::task::{NewTask, Task, TaskUpdate};
use crate::services::ranking::{self, RankedMember};
use crate::services::tracker_service::{
    DashboardSummary, Leaderboard, MemberDetail, MemberRankings, TaskDraft, TaskWithOwner,
    TrackerError, TrackerService,
};
use crate::services::validation;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::info;

const RECENT_MEMBERS: u64 = 5;
const RECENT_TASKS: u64 = 10;
const TOP_PERFORMERS: usize = 5;

pub struct SeaOrmTrackerService {
    store: Store,
}

impl SeaOrmTrackerService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn ranked_members(&self) -> Result<Vec<RankedMember>, TrackerError> {
        let members = self.store.list_members().await?;
        let counts = self.store.task_counts_by_member().await?;
        Ok(ranking::rank_members(members, &counts))
    }

    async fn require_member(&self, reg_number: &str) -> Result<Member, TrackerError> {
        self.store
            .get_member_by_reg_number(reg_number)
            .await?
            .ok_or_else(|| TrackerError::member_not_found(reg_number))
    }

    async fn attach_owners(&self, tasks: Vec<Task>) -> Result<Vec<TaskWithOwner>, TrackerError> {
        let owners: HashMap<i32, Member> = self
            .store
            .list_members()
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        Ok(tasks
            .into_iter()
            .map(|task| {
                let (member_name, member_reg_number) = owners
                    .get(&task.member_id)
                    .map(|m| (m.name.clone(), m.reg_number.clone()))
                    .unwrap_or_default();
                TaskWithOwner {
                    task,
                    member_name,
                    member_reg_number,
                }
            })
            .collect())
    }

    async fn ensure_unique(
        &self,
        reg_number: Option<&str>,
        email: Option<&str>,
        except_id: Option<i32>,
    ) -> Result<(), TrackerError> {
        if let Some(reg_number) = reg_number
            && let Some(existing) = self.store.get_member_by_reg_number(reg_number).await?
            && Some(existing.id) != except_id
        {
            return Err(TrackerError::Conflict(format!(
                "Registration number '{reg_number}' is already taken"
            )));
        }

        if let Some(email) = email
            && let Some(existing) = self.store.get_member_by_email(email).await?
            && Some(existing.id) != except_id
        {
            return Err(TrackerError::Conflict(format!(
                "Email '{email}' is already registered"
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl TrackerService for SeaOrmTrackerService {
    async fn dashboard(&self) -> Result<DashboardSummary, TrackerError> {
        let total_members = self.store.count_members().await?;
        let total_tasks = self.store.count_tasks().await?;
        let completed_tasks = self.store.count_completed_tasks().await?;
        let total_credits = self.store.completed_credits_total().await?;

        let recent_members = self.store.list_recent_members(RECENT_MEMBERS).await?;
        let recent_tasks = self
            .store
            .list_tasks(TaskFilter {
                limit: Some(RECENT_TASKS),
                ..TaskFilter::default()
            })
            .await?;
        let recent_tasks = self.attach_owners(recent_tasks).await?;

        let mut top_performers = self.ranked_members().await?;
        top_performers.truncate(TOP_PERFORMERS);

        Ok(DashboardSummary {
            total_members,
            total_tasks,
            completed_tasks,
            total_credits,
            completion_rate: ranking::completion_rate(completed_tasks, total_tasks),
            recent_members,
            recent_tasks,
            top_performers,
        })
    }

    async fn member_rankings(&self) -> Result<MemberRankings, TrackerError> {
        let members = self.ranked_members().await?;
        Ok(MemberRankings {
            total_members: members.len(),
            top_performer: members.first().cloned(),
            members,
        })
    }

    async fn member_detail(&self, reg_number: &str) -> Result<MemberDetail, TrackerError> {
        let member = self.require_member(reg_number).await?;

        let tasks = self
            .store
            .list_tasks(TaskFilter {
                member_id: Some(member.id),
                ..TaskFilter::default()
            })
            .await?;

        let (completed_tasks, pending_tasks): (Vec<Task>, Vec<Task>) =
            tasks.iter().cloned().partition(|t| t.is_completed);

        let total_credits = completed_tasks
            .iter()
            .map(|t| i64::from(t.credits))
            .sum();
        let completion_rate =
            ranking::completion_rate(completed_tasks.len() as u64, tasks.len() as u64);

        Ok(MemberDetail {
            member,
            tasks,
            completed_tasks,
            pending_tasks,
            total_credits,
            completion_rate,
        })
    }

    async fn leaderboard(&self) -> Result<Leaderboard, TrackerError> {
        let members = self.ranked_members().await?;
        let podium = ranking::podium(&members);
        Ok(Leaderboard { members, podium })
    }

    async fn create_member(&self, member: NewMember) -> Result<Member, TrackerError> {
        let member = NewMember {
            name: validation::validate_name(&member.name)?,
            reg_number: validation::validate_reg_number(&member.reg_number)?,
            email: validation::validate_email(&member.email)?,
        };

        self.ensure_unique(Some(&member.reg_number), Some(&member.email), None)
            .await?;

        Ok(self.store.add_member(&member).await?)
    }

    async fn update_member(
        &self,
        reg_number: &str,
        update: MemberUpdate,
    ) -> Result<Member, TrackerError> {
        if update.is_empty() {
            return Err(TrackerError::validation("Nothing to update"));
        }

        let member = self.require_member(reg_number).await?;

        let update = MemberUpdate {
            name: update
                .name
                .as_deref()
                .map(validation::validate_name)
                .transpose()?,
            email: update
                .email
                .as_deref()
                .map(validation::validate_email)
                .transpose()?,
        };

        self.ensure_unique(None, update.email.as_deref(), Some(member.id))
            .await?;

        self.store
            .update_member(member.id, &update)
            .await?
            .ok_or_else(|| TrackerError::member_not_found(reg_number))
    }

    async fn delete_member(&self, reg_number: &str) -> Result<(), TrackerError> {
        let member = self.require_member(reg_number).await?;
        self.store.remove_member(member.id).await?;
        info!("Deleted member {}", member);
        Ok(())
    }

    async fn list_members(&self) -> Result<Vec<Member>, TrackerError> {
        Ok(self.store.list_members().await?)
    }

    async fn search_members(&self, query: &str) -> Result<Vec<Member>, TrackerError> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_members().await;
        }
        Ok(self.store.search_members(query).await?)
    }

    async fn create_task(&self, reg_number: &str, draft: TaskDraft) -> Result<Task, TrackerError> {
        let member = self.require_member(reg_number).await?;

        let task = NewTask {
            member_id: member.id,
            title: validation::validate_title(&draft.title)?,
            description: validation::normalize_description(draft.description),
            credits: validation::validate_credits(draft.credits)?,
            is_completed: draft.is_completed,
            due_date: draft
                .due_date
                .as_deref()
                .map(validation::normalize_due_date)
                .transpose()?,
            created_at: None,
        };

        let task = self.store.add_task(&task).await?;
        info!(
            "Added task {} '{}' for {} ({} credits)",
            task.id, task.title, member.reg_number, task.credits
        );
        Ok(task)
    }

    async fn update_task(&self, id: i32, update: TaskUpdate) -> Result<Task, TrackerError> {
        if update.is_empty() {
            return Err(TrackerError::validation("Nothing to update"));
        }

        let update = TaskUpdate {
            title: update
                .title
                .as_deref()
                .map(validation::validate_title)
                .transpose()?,
            description: update.description.map(validation::normalize_description),
            credits: update.credits.map(validation::validate_credits).transpose()?,
            is_completed: update.is_completed,
            due_date: match update.due_date {
                Some(Some(raw)) => Some(Some(validation::normalize_due_date(&raw)?)),
                other => other,
            },
        };

        self.store
            .update_task(id, &update)
            .await?
            .ok_or_else(|| TrackerError::task_not_found(id))
    }

    async fn set_task_completion(&self, id: i32, completed: bool) -> Result<Task, TrackerError> {
        self.update_task(id, TaskUpdate::completion(completed))
            .await
    }

    async fn delete_task(&self, id: i32) -> Result<(), TrackerError> {
        if self.store.remove_task(id).await? {
            Ok(())
        } else {
            Err(TrackerError::task_not_found(id))
        }
    }

    async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<TaskWithOwner>, TrackerError> {
        let tasks = self.store.list_tasks(filter).await?;
        self.attach_owners(tasks).await
    }
}
