//! Demo data for local development and screenshots.

use crate::db::Store;
use crate::models::format_timestamp;
use crate::models::member::NewMember;
use crate::models::task::NewTask;
use anyhow::Result;
use chrono::{Duration, Utc};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::info;

const SAMPLE_MEMBERS: [(&str, &str, &str); 8] = [
    ("Alice Johnson", "REG001", "alice.johnson@example.com"),
    ("Bob Smith", "REG002", "bob.smith@example.com"),
    ("Charlie Brown", "REG003", "charlie.brown@example.com"),
    ("Diana Ross", "REG004", "diana.ross@example.com"),
    ("Edward Wilson", "REG005", "edward.wilson@example.com"),
    ("Fiona Davis", "REG006", "fiona.davis@example.com"),
    ("George Miller", "REG007", "george.miller@example.com"),
    ("Hannah Lee", "REG008", "hannah.lee@example.com"),
];

const SAMPLE_TASKS: [(&str, &str); 20] = [
    (
        "Complete project documentation",
        "This task involves creating comprehensive documentation for the project.",
    ),
    (
        "Review code implementation",
        "Review the codebase and provide feedback on implementation quality.",
    ),
    (
        "Prepare presentation slides",
        "Prepare slides for the upcoming team presentation.",
    ),
    (
        "Conduct user testing",
        "Conduct thorough testing with end users to gather feedback.",
    ),
    (
        "Write unit tests",
        "Write comprehensive unit tests to ensure code quality.",
    ),
    (
        "Design database schema",
        "Design an efficient and scalable database schema.",
    ),
    (
        "Implement authentication",
        "Implement secure user authentication and authorization.",
    ),
    (
        "Create API endpoints",
        "Create RESTful API endpoints for the application.",
    ),
    (
        "Update user interface",
        "Update the user interface to improve user experience.",
    ),
    (
        "Optimize performance",
        "Optimize application performance and reduce load times.",
    ),
    (
        "Fix reported bugs",
        "Investigate and fix bugs reported by users.",
    ),
    (
        "Research new technologies",
        "Research emerging technologies that could benefit the project.",
    ),
    (
        "Setup development environment",
        "Setup a consistent development environment for the team.",
    ),
    (
        "Deploy to staging",
        "Deploy the application to the staging environment.",
    ),
    (
        "Create user manual",
        "Create detailed user documentation and guides.",
    ),
    (
        "Analyze requirements",
        "Analyze project requirements and create specifications.",
    ),
    (
        "Design system architecture",
        "Design the overall system architecture and components.",
    ),
    (
        "Implement data validation",
        "Implement robust data validation and error handling.",
    ),
    (
        "Create backup strategy",
        "Create a comprehensive backup and recovery strategy.",
    ),
    (
        "Monitor system metrics",
        "Setup monitoring to track system performance and health.",
    ),
];

const COMPLETION_CHANCE: f64 = 0.7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleDataSummary {
    pub members: usize,
    pub tasks: usize,
    pub completed: usize,
}

/// Replaces every member and task with a fresh randomized demo set.
pub async fn generate_sample_data<R: Rng>(store: &Store, rng: &mut R) -> Result<SampleDataSummary> {
    store.clear_all().await?;

    let mut summary = SampleDataSummary::default();
    let now = Utc::now();

    for (name, reg_number, email) in SAMPLE_MEMBERS {
        let member = store
            .add_member(&NewMember {
                name: name.to_string(),
                reg_number: reg_number.to_string(),
                email: email.to_string(),
            })
            .await?;
        summary.members += 1;

        let count = rng.random_range(3..=8);
        let picks: Vec<(&str, &str)> = SAMPLE_TASKS.choose_multiple(rng, count).copied().collect();

        for (title, description) in picks {
            let is_completed = rng.random_bool(COMPLETION_CHANCE);
            let credits = rng.random_range(1..=10u32) * 10;
            let due_date = now + Duration::days(rng.random_range(1..=30));
            let created_at = now - Duration::days(rng.random_range(1..=60));

            let task = store
                .add_task(&NewTask {
                    member_id: member.id,
                    title: format!("{title} - {}", member.name),
                    description: Some(description.to_string()),
                    credits,
                    is_completed,
                    due_date: Some(format_timestamp(due_date)),
                    created_at: Some(format_timestamp(created_at)),
                })
                .await?;

            summary.tasks += 1;
            if task.is_completed {
                summary.completed += 1;
            }
        }
    }

    info!(
        "Created {} sample members and {} tasks ({} completed)",
        summary.members, summary.tasks, summary.completed
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::TaskFilter;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[tokio::test]
    async fn seeded_data_respects_generation_rules() {
        let store = Store::in_memory().await.unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let summary = generate_sample_data(&store, &mut rng).await.unwrap();
        assert_eq!(summary.members, 8);
        assert!((24..=64).contains(&summary.tasks));

        let members = store.list_members().await.unwrap();
        assert_eq!(members.len(), 8);

        for member in &members {
            let tasks = store
                .list_tasks(TaskFilter {
                    member_id: Some(member.id),
                    ..TaskFilter::default()
                })
                .await
                .unwrap();
            assert!((3..=8).contains(&tasks.len()));

            let titles: HashSet<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
            assert_eq!(titles.len(), tasks.len(), "titles repeat for {member}");

            for task in &tasks {
                assert!(task.title.ends_with(&format!(" - {}", member.name)));
                assert_eq!(task.credits % 10, 0);
                assert!((10..=100).contains(&task.credits));
                assert!(task.due_date.as_deref().unwrap() > task.created_at.as_str());
            }
        }
    }

    #[tokio::test]
    async fn regenerating_replaces_previous_rows() {
        let store = Store::in_memory().await.unwrap();

        generate_sample_data(&store, &mut StdRng::seed_from_u64(1))
            .await
            .unwrap();
        let second = generate_sample_data(&store, &mut StdRng::seed_from_u64(2))
            .await
            .unwrap();

        assert_eq!(store.count_members().await.unwrap(), 8);
        assert_eq!(store.count_tasks().await.unwrap(), second.tasks as u64);
    }
}
