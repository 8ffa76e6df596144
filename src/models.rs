use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A closed set of values that analytics can tally per variant.
pub trait Category: Copy + Ord + 'static {
    const ALL: &'static [Self];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl Category for Priority {
    const ALL: &'static [Self] = &[Priority::Low, Priority::Medium, Priority::High];
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Priority::Low),
            "Medium" => Ok(Priority::Medium),
            "High" => Ok(Priority::High),
            _ => Err("Priority must be Low, Medium, or High".to_string()),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration order is the lifecycle order used when sorting by status.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Status {
    #[default]
    Todo,
    #[serde(rename = "In Progress", alias = "InProgress")]
    InProgress,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "Todo",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }
}

impl Category for Status {
    const ALL: &'static [Self] = &[Status::Todo, Status::InProgress, Status::Completed];
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Todo" => Ok(Status::Todo),
            "In Progress" | "InProgress" => Ok(Status::InProgress),
            "Completed" => Ok(Status::Completed),
            _ => Err("Status must be Todo, In Progress, or Completed".to_string()),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    pub due_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The user-editable fields of a task, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    pub due_date: DateTime<Utc>,
}

impl Task {
    pub fn create(user_id: Uuid, draft: TaskDraft, now: DateTime<Utc>) -> Self {
        let completed_at = (draft.status == Status::Completed).then_some(now);
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            status: draft.status,
            due_date: draft.due_date,
            completed_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies `draft` on top of this task. `id`, `user_id` and `created_at`
    /// are carried over; `completed_at` follows the status transition.
    pub fn revise(&self, draft: TaskDraft, now: DateTime<Utc>) -> Self {
        let completed_at = match (self.status, draft.status) {
            (_, next) if next != Status::Completed => None,
            // legacy rows have no completed_at; freeze the approximation
            (Status::Completed, _) => self.completed_at.or(Some(self.updated_at)),
            _ => Some(now),
        };

        Self {
            id: self.id,
            user_id: self.user_id,
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            status: draft.status,
            due_date: draft.due_date,
            completed_at,
            created_at: self.created_at,
            updated_at: now,
        }
    }

    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            priority: self.priority,
            status: self.status,
            due_date: self.due_date,
        }
    }

    /// When the task became Completed, if it is Completed.
    ///
    /// Falls back to `updated_at` for tasks completed before `completed_at`
    /// was recorded, which conflates any later edit with completion.
    pub fn completion_time(&self) -> Option<DateTime<Utc>> {
        (self.status == Status::Completed).then(|| self.completed_at.unwrap_or(self.updated_at))
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}
