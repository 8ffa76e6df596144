//! Task listing criteria.
//!
//! Turns the raw query-string parameters of the listing endpoint into a
//! [`TaskFilter`]: exact-match priority/status, case-insensitive title
//! search, and an allow-listed sort key. Stores either evaluate the filter
//! in memory via [`TaskFilter::apply`] or translate it to SQL.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::Deserialize;

use crate::models::{Priority, Status, Task};

/// Query-string parameters accepted by `GET /api/tasks`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksParams {
    pub priority: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// An exact-match constraint on one enum field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion<T> {
    Any,
    Exactly(T),
    /// The caller asked for a value outside the enum; nothing can match.
    Unsatisfiable,
}

impl<T: FromStr + PartialEq> Criterion<T> {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Criterion::Any,
            Some(value) => value
                .parse()
                .map(Criterion::Exactly)
                .unwrap_or(Criterion::Unsatisfiable),
        }
    }

    pub fn admits(&self, value: &T) -> bool {
        match self {
            Criterion::Any => true,
            Criterion::Exactly(expected) => expected == value,
            Criterion::Unsatisfiable => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
    Status,
    Title,
}

impl SortField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            "dueDate" => Some(SortField::DueDate),
            "priority" => Some(SortField::Priority),
            "status" => Some(SortField::Status),
            "title" => Some(SortField::Title),
            _ => None,
        }
    }

    /// SQL ordering expression over the `tasks` table.
    pub fn sql_expr(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::DueDate => "due_date",
            SortField::Priority => {
                "CASE priority WHEN 'Low' THEN 0 WHEN 'Medium' THEN 1 ELSE 2 END"
            }
            SortField::Status => {
                "CASE status WHEN 'Todo' THEN 0 WHEN 'In Progress' THEN 1 ELSE 2 END"
            }
            // code point order, same as `str::cmp`
            SortField::Title => "LOWER(title) COLLATE \"C\"",
        }
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::DueDate => a.due_date.cmp(&b.due_date),
            SortField::Priority => a.priority.cmp(&b.priority),
            SortField::Status => a.status.cmp(&b.status),
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Only `desc` (surrounding whitespace ignored) sorts descending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    pub fn sql_keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for Sort {
    /// Newest first.
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

impl Sort {
    /// Ties on the sort key fall back to ascending id.
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let ordering = match self.order {
            SortOrder::Asc => self.field.compare(a, b),
            SortOrder::Desc => self.field.compare(a, b).reverse(),
        };
        ordering.then_with(|| a.id.cmp(&b.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub priority: Criterion<Priority>,
    pub status: Criterion<Status>,
    /// Lowercased search term, matched as-is including whitespace.
    pub search: Option<String>,
    pub sort: Sort,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            priority: Criterion::Any,
            status: Criterion::Any,
            search: None,
            sort: Sort::default(),
        }
    }
}

impl From<&ListTasksParams> for TaskFilter {
    fn from(params: &ListTasksParams) -> Self {
        let search = params
            .search
            .as_deref()
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);

        let sort = match params.sort_by.as_deref().map(str::trim) {
            None | Some("") => Sort::default(),
            Some(name) => match SortField::parse(name) {
                Some(field) => Sort {
                    field,
                    order: SortOrder::parse(params.sort_order.as_deref()),
                },
                None => {
                    tracing::debug!(sort_by = name, "ignoring unsupported sort field");
                    Sort::default()
                }
            },
        };

        Self {
            priority: Criterion::parse(params.priority.as_deref()),
            status: Criterion::parse(params.status.as_deref()),
            search,
            sort,
        }
    }
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.priority.admits(&task.priority)
            && self.status.admits(&task.status)
            && self
                .search
                .as_ref()
                .map_or(true, |term| task.title.to_lowercase().contains(term.as_str()))
    }

    /// Keeps the matching tasks and orders them by the sort key.
    pub fn apply(&self, tasks: impl IntoIterator<Item = Task>) -> Vec<Task> {
        let mut selected: Vec<Task> = tasks.into_iter().filter(|t| self.matches(t)).collect();
        selected.sort_by(|a, b| self.sort.compare(a, b));
        selected
    }
}
