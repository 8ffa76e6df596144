use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{Priority, Status, Task, TaskDraft};

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 500;

// Enum and date fields arrive as strings so bad values become 400s with our
// own messages instead of JSON rejections.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
}

/// Fields left out keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatus {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub success: bool,
    pub task: Task,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub success: bool,
    pub count: usize,
    pub tasks: Vec<Task>,
}

impl CreateTask {
    pub fn into_draft(self) -> Result<TaskDraft, AppError> {
        let title = self
            .title
            .ok_or_else(|| invalid("Please provide a task title"))?;
        let priority = self
            .priority
            .ok_or_else(|| invalid("Please specify task priority"))?;
        let due_date = self
            .due_date
            .ok_or_else(|| invalid("Please provide a due date"))?;

        Ok(TaskDraft {
            title: validate_title(&title)?,
            description: validate_description(self.description.as_deref())?,
            priority: parse_priority(&priority)?,
            status: match self.status.as_deref() {
                Some(status) => parse_status(status)?,
                None => Status::default(),
            },
            due_date: parse_due_date(&due_date)?,
        })
    }
}

impl UpdateTask {
    pub fn merge_into(self, current: &Task) -> Result<TaskDraft, AppError> {
        let mut draft = current.draft();

        if let Some(title) = self.title {
            draft.title = validate_title(&title)?;
        }
        if let Some(description) = self.description {
            draft.description = validate_description(Some(&description))?;
        }
        if let Some(priority) = self.priority {
            draft.priority = parse_priority(&priority)?;
        }
        if let Some(status) = self.status {
            draft.status = parse_status(&status)?;
        }
        if let Some(due_date) = self.due_date {
            draft.due_date = parse_due_date(&due_date)?;
        }

        Ok(draft)
    }
}

impl UpdateStatus {
    pub fn merge_into(self, current: &Task) -> Result<TaskDraft, AppError> {
        let status = self
            .status
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| invalid("Please provide status"))?;

        Ok(TaskDraft {
            status: parse_status(&status)?,
            ..current.draft()
        })
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Validation(message.to_string())
}

fn validate_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    let len = title.chars().count();
    if len == 0 {
        return Err(invalid("Please provide a task title"));
    }
    if len < TITLE_MIN {
        return Err(invalid("Title must be at least 3 characters long"));
    }
    if len > TITLE_MAX {
        return Err(invalid("Title cannot exceed 100 characters"));
    }
    Ok(title.to_string())
}

fn validate_description(raw: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(description) = raw.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(invalid("Description cannot exceed 500 characters"));
    }
    Ok(Some(description.to_string()))
}

fn parse_priority(raw: &str) -> Result<Priority, AppError> {
    raw.trim().parse().map_err(AppError::Validation)
}

fn parse_status(raw: &str) -> Result<Status, AppError> {
    raw.trim().parse().map_err(AppError::Validation)
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| invalid("Due date must be a valid date"))
}
