use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i32,
    pub member_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub credits: u32,
    pub is_completed: bool,
    pub created_at: String,
    pub updated_at: String,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub member_id: i32,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub credits: u32,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub due_date: Option<String>,
    /// Overrides the creation time; used when back-filling historical data.
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Partial update. `Some(None)` on an optional column clears it.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub credits: Option<u32>,
    pub is_completed: Option<bool>,
    pub due_date: Option<Option<String>>,
}

impl TaskUpdate {
    #[must_use]
    pub const fn completion(is_completed: bool) -> Self {
        Self {
            title: None,
            description: None,
            credits: None,
            is_completed: Some(is_completed),
            due_date: None,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.credits.is_none()
            && self.is_completed.is_none()
            && self.due_date.is_none()
    }
}
