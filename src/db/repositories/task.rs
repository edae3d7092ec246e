use crate::entities::{prelude::*, tasks};
use crate::models::now_timestamp;
use crate::models::task::{NewTask, Task, TaskUpdate};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use std::collections::HashMap;

/// Raw per-member task counters, straight from grouped queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemberTaskCounts {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub completed_credits: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFilter {
    pub member_id: Option<i32>,
    pub completed: Option<bool>,
    pub limit: Option<u64>,
}

pub struct TaskRepository {
    conn: DatabaseConnection,
}

impl TaskRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: tasks::Model) -> Task {
        Task {
            id: model.id,
            member_id: model.member_id,
            title: model.title,
            description: model.description,
            credits: u32::try_from(model.credits).unwrap_or(0),
            is_completed: model.is_completed,
            created_at: model.created_at,
            updated_at: model.updated_at,
            due_date: model.due_date,
        }
    }

    fn credits_column(credits: u32) -> Result<i32> {
        i32::try_from(credits).context("credits value is too large")
    }

    fn newest_first(select: Select<Tasks>) -> Select<Tasks> {
        select
            .order_by_desc(tasks::Column::CreatedAt)
            .order_by_desc(tasks::Column::Id)
    }

    pub async fn add(&self, task: &NewTask) -> Result<Task> {
        let now = now_timestamp();
        let created_at = task.created_at.clone().unwrap_or_else(|| now.clone());

        let active_model = tasks::ActiveModel {
            member_id: Set(task.member_id),
            title: Set(task.title.clone()),
            description: Set(task.description.clone()),
            credits: Set(Self::credits_column(task.credits)?),
            is_completed: Set(task.is_completed),
            created_at: Set(created_at),
            updated_at: Set(now),
            due_date: Set(task.due_date.clone()),
            ..Default::default()
        };

        let model = active_model.insert(&self.conn).await?;
        Ok(Self::map_model(model))
    }

    pub async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        let mut select = Tasks::find();

        if let Some(member_id) = filter.member_id {
            select = select.filter(tasks::Column::MemberId.eq(member_id));
        }
        if let Some(completed) = filter.completed {
            select = select.filter(tasks::Column::IsCompleted.eq(completed));
        }

        let mut select = Self::newest_first(select);
        if let Some(limit) = filter.limit {
            select = select.limit(limit);
        }

        let rows = select.all(&self.conn).await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn update(&self, id: i32, update: &TaskUpdate) -> Result<Option<Task>> {
        let Some(model) = Tasks::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: tasks::ActiveModel = model.into();
        if let Some(title) = &update.title {
            active.title = Set(title.clone());
        }
        if let Some(description) = &update.description {
            active.description = Set(description.clone());
        }
        if let Some(credits) = update.credits {
            active.credits = Set(Self::credits_column(credits)?);
        }
        if let Some(is_completed) = update.is_completed {
            active.is_completed = Set(is_completed);
        }
        if let Some(due_date) = &update.due_date {
            active.due_date = Set(due_date.clone());
        }
        active.updated_at = Set(now_timestamp());

        let model = active.update(&self.conn).await?;
        Ok(Some(Self::map_model(model)))
    }

    pub async fn remove(&self, id: i32) -> Result<bool> {
        let result = Tasks::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Tasks::find().count(&self.conn).await?)
    }

    pub async fn count_completed(&self) -> Result<u64> {
        Ok(Tasks::find()
            .filter(tasks::Column::IsCompleted.eq(true))
            .count(&self.conn)
            .await?)
    }

    /// Sum of credits over completed tasks; zero when there are none.
    pub async fn completed_credits_total(&self) -> Result<i64> {
        let total: Option<Option<i64>> = Tasks::find()
            .select_only()
            .column_as(tasks::Column::Credits.sum(), "total")
            .filter(tasks::Column::IsCompleted.eq(true))
            .into_tuple()
            .one(&self.conn)
            .await?;

        Ok(total.flatten().unwrap_or(0))
    }

    /// Per-member counters. Members without tasks are absent from the map.
    pub async fn counts_by_member(&self) -> Result<HashMap<i32, MemberTaskCounts>> {
        let totals: Vec<(i32, i64)> = Tasks::find()
            .select_only()
            .column(tasks::Column::MemberId)
            .column_as(tasks::Column::Id.count(), "total")
            .group_by(tasks::Column::MemberId)
            .into_tuple()
            .all(&self.conn)
            .await?;

        let completed: Vec<(i32, i64, i64)> = Tasks::find()
            .select_only()
            .column(tasks::Column::MemberId)
            .column_as(tasks::Column::Id.count(), "completed")
            .column_as(tasks::Column::Credits.sum(), "credits")
            .filter(tasks::Column::IsCompleted.eq(true))
            .group_by(tasks::Column::MemberId)
            .into_tuple()
            .all(&self.conn)
            .await?;

        let mut map: HashMap<i32, MemberTaskCounts> = HashMap::new();
        for (member_id, total) in totals {
            map.entry(member_id).or_default().total_tasks = total;
        }
        for (member_id, count, credits) in completed {
            let entry = map.entry(member_id).or_default();
            entry.completed_tasks = count;
            entry.completed_credits = credits;
        }

        Ok(map)
    }
}
