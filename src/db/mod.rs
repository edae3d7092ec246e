use crate::models::member::{Member, MemberUpdate, NewMember};
use crate::models::task::{NewTask, Task, TaskUpdate};
use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::task::{MemberTaskCounts, TaskFilter};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    /// Single-connection in-memory store. Every pooled connection to
    /// `sqlite::memory:` would otherwise see its own empty database.
    pub async fn in_memory() -> Result<Self> {
        Self::with_pool_options("sqlite::memory:", 1, 1).await
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn member_repo(&self) -> repositories::member::MemberRepository {
        repositories::member::MemberRepository::new(self.conn.clone())
    }

    fn task_repo(&self) -> repositories::task::TaskRepository {
        repositories::task::TaskRepository::new(self.conn.clone())
    }

    pub async fn add_member(&self, member: &NewMember) -> Result<Member> {
        self.member_repo().add(member).await
    }

    pub async fn get_member_by_reg_number(&self, reg_number: &str) -> Result<Option<Member>> {
        self.member_repo().get_by_reg_number(reg_number).await
    }

    pub async fn get_member_by_email(&self, email: &str) -> Result<Option<Member>> {
        self.member_repo().get_by_email(email).await
    }

    pub async fn list_members(&self) -> Result<Vec<Member>> {
        self.member_repo().list_alphabetical().await
    }

    pub async fn list_recent_members(&self, limit: u64) -> Result<Vec<Member>> {
        self.member_repo().list_recent(limit).await
    }

    pub async fn search_members(&self, query: &str) -> Result<Vec<Member>> {
        self.member_repo().search(query).await
    }

    pub async fn count_members(&self) -> Result<u64> {
        self.member_repo().count().await
    }

    pub async fn update_member(&self, id: i32, update: &MemberUpdate) -> Result<Option<Member>> {
        self.member_repo().update(id, update).await
    }

    pub async fn remove_member(&self, id: i32) -> Result<bool> {
        self.member_repo().remove(id).await
    }

    pub async fn clear_all(&self) -> Result<()> {
        self.member_repo().clear_all().await
    }

    pub async fn add_task(&self, task: &NewTask) -> Result<Task> {
        self.task_repo().add(task).await
    }

    pub async fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        self.task_repo().list(filter).await
    }

    pub async fn update_task(&self, id: i32, update: &TaskUpdate) -> Result<Option<Task>> {
        self.task_repo().update(id, update).await
    }

    pub async fn remove_task(&self, id: i32) -> Result<bool> {
        self.task_repo().remove(id).await
    }

    pub async fn count_tasks(&self) -> Result<u64> {
        self.task_repo().count().await
    }

    pub async fn count_completed_tasks(&self) -> Result<u64> {
        self.task_repo().count_completed().await
    }

    pub async fn completed_credits_total(&self) -> Result<i64> {
        self.task_repo().completed_credits_total().await
    }

    pub async fn task_counts_by_member(&self) -> Result<HashMap<i32, MemberTaskCounts>> {
        self.task_repo().counts_by_member().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_member(name: &str, reg: &str) -> NewMember {
        NewMember {
            name: name.to_string(),
            reg_number: reg.to_string(),
            email: format!("{}@example.com", reg.to_lowercase()),
        }
    }

    fn new_task(member_id: i32, credits: u32, is_completed: bool) -> NewTask {
        NewTask {
            member_id,
            title: "Write unit tests".to_string(),
            description: None,
            credits,
            is_completed,
            due_date: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn removing_member_cascades_to_tasks() {
        let store = Store::in_memory().await.unwrap();
        let alice = store.add_member(&new_member("Alice", "REG001")).await.unwrap();
        let bob = store.add_member(&new_member("Bob", "REG002")).await.unwrap();

        store.add_task(&new_task(alice.id, 10, true)).await.unwrap();
        store.add_task(&new_task(alice.id, 20, false)).await.unwrap();
        store.add_task(&new_task(bob.id, 30, true)).await.unwrap();

        assert!(store.remove_member(alice.id).await.unwrap());

        let remaining = store.list_tasks(TaskFilter::default()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.iter().all(|t| t.member_id == bob.id));
        assert!(!store.remove_member(alice.id).await.unwrap());
    }

    #[tokio::test]
    async fn counts_by_member_only_sums_completed_credits() {
        let store = Store::in_memory().await.unwrap();
        let alice = store.add_member(&new_member("Alice", "REG001")).await.unwrap();
        let bob = store.add_member(&new_member("Bob", "REG002")).await.unwrap();

        store.add_task(&new_task(alice.id, 40, true)).await.unwrap();
        store.add_task(&new_task(alice.id, 60, true)).await.unwrap();
        store.add_task(&new_task(alice.id, 90, false)).await.unwrap();
        store.add_task(&new_task(bob.id, 50, false)).await.unwrap();

        let counts = store.task_counts_by_member().await.unwrap();
        assert_eq!(
            counts[&alice.id],
            MemberTaskCounts {
                total_tasks: 3,
                completed_tasks: 2,
                completed_credits: 100,
            }
        );
        assert_eq!(counts[&bob.id].completed_credits, 0);
        assert_eq!(counts[&bob.id].total_tasks, 1);

        assert_eq!(store.completed_credits_total().await.unwrap(), 100);
        assert_eq!(store.count_completed_tasks().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn completed_credits_total_is_zero_without_rows() {
        let store = Store::in_memory().await.unwrap();
        assert_eq!(store.completed_credits_total().await.unwrap(), 0);
        assert!(store.task_counts_by_member().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_reg_number_is_rejected_by_schema() {
        let store = Store::in_memory().await.unwrap();
        store.add_member(&new_member("Alice", "REG001")).await.unwrap();

        let mut dup = new_member("Alicia", "REG001");
        dup.email = "other@example.com".to_string();
        assert!(store.add_member(&dup).await.is_err());
    }

    #[tokio::test]
    async fn members_list_alphabetically_ignoring_case() {
        let store = Store::in_memory().await.unwrap();
        for (name, reg) in [("Zed", "REG001"), ("amy", "REG002"), ("Bob", "REG003")] {
            store.add_member(&new_member(name, reg)).await.unwrap();
        }

        let names: Vec<String> = store
            .list_members()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["amy", "Bob", "Zed"]);
    }

    #[tokio::test]
    async fn tasks_list_newest_first() {
        let store = Store::in_memory().await.unwrap();
        let alice = store.add_member(&new_member("Alice", "REG001")).await.unwrap();

        for (day, title) in [(1, "old"), (3, "newest"), (2, "middle")] {
            let mut task = new_task(alice.id, 10, false);
            task.title = title.to_string();
            task.created_at = Some(format!("2025-01-0{day}T00:00:00.000000Z"));
            store.add_task(&task).await.unwrap();
        }

        let titles: Vec<String> = store
            .list_tasks(TaskFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["newest", "middle", "old"]);
    }
}
