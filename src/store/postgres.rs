use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{StoreError, StoreResult, TaskStore, UserStore};
use crate::models::{Priority, Status, Task, User};
use crate::query::{Criterion, TaskFilter};

const TASK_COLUMNS: &str = "id, user_id, title, description, priority, status, due_date, \
                            completed_at, created_at, updated_at";

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Enum columns are TEXT guarded by CHECK constraints.
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: Option<String>,
    priority: String,
    status: String,
    due_date: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |reason: String| StoreError::Corrupt { id, reason };
        let priority = row.priority.parse::<Priority>().map_err(corrupt)?;
        let status = row.status.parse::<Status>().map_err(corrupt)?;

        Ok(Task {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            priority,
            status,
            due_date: row.due_date,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    full_name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            full_name: row.full_name,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

fn into_tasks(rows: Vec<TaskRow>) -> StoreResult<Vec<Task>> {
    rows.into_iter().map(Task::try_from).collect()
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db_error| db_error.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

/// Builds the owner-scoped listing query. Only bound parameters carry
/// caller input; the ORDER BY clause comes from allow-listed fragments.
fn listing_query(owner: Uuid, filter: &TaskFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = "));
    qb.push_bind(owner);

    match filter.priority {
        Criterion::Any => {}
        Criterion::Exactly(priority) => {
            qb.push(" AND priority = ").push_bind(priority.as_str());
        }
        Criterion::Unsatisfiable => {
            qb.push(" AND FALSE");
        }
    }

    match filter.status {
        Criterion::Any => {}
        Criterion::Exactly(status) => {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        Criterion::Unsatisfiable => {
            qb.push(" AND FALSE");
        }
    }

    if let Some(term) = &filter.search {
        qb.push(" AND POSITION(")
            .push_bind(term.clone())
            .push(" IN LOWER(title)) > 0");
    }

    qb.push(" ORDER BY ")
        .push(filter.sort.field.sql_expr())
        .push(" ")
        .push(filter.sort.order.sql_keyword())
        .push(", id ASC");

    qb
}

#[async_trait]
impl TaskStore for PgStore {
    async fn find_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1 ORDER BY created_at DESC, id ASC"
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        into_tasks(rows)
    }

    async fn find_by_owner_with_filter(
        &self,
        owner: Uuid,
        filter: &TaskFilter,
    ) -> StoreResult<Vec<Task>> {
        let rows = listing_query(owner, filter)
            .build_query_as::<TaskRow>()
            .fetch_all(&self.pool)
            .await?;

        into_tasks(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Task::try_from).transpose()
    }

    async fn insert(&self, task: &Task) -> StoreResult<()> {
        sqlx::query(&format!(
            "INSERT INTO tasks ({TASK_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        ))
        .bind(task.id)
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.as_str())
        .bind(task.status.as_str())
        .bind(task.due_date)
        .bind(task.completed_at)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(format!("task {}", task.id))
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn replace(&self, task: &Task) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET
                title = $2,
                description = $3,
                priority = $4,
                status = $5,
                due_date = $6,
                completed_at = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.as_str())
        .bind(task.status.as_str())
        .bind(task.due_date)
        .bind(task.completed_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, full_name, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(format!("user {}", user.email))
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, full_name, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, full_name, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ListTasksParams;

    fn sql_for(params: ListTasksParams) -> String {
        listing_query(Uuid::nil(), &TaskFilter::from(&params))
            .sql()
            .to_string()
    }

    #[test]
    fn test_default_listing_sql() {
        let sql = sql_for(ListTasksParams::default());
        assert!(sql.contains("WHERE user_id = $1"));
        assert!(sql.ends_with("ORDER BY created_at DESC, id ASC"));
    }

    #[test]
    fn test_filters_are_bound_parameters() {
        let sql = sql_for(ListTasksParams {
            priority: Some("High".to_string()),
            status: Some("In Progress".to_string()),
            search: Some("'; DROP TABLE tasks; --".to_string()),
            sort_by: Some("dueDate".to_string()),
            sort_order: Some("asc".to_string()),
        });

        assert!(sql.contains("AND priority = $2"));
        assert!(sql.contains("AND status = $3"));
        assert!(sql.contains("POSITION($4 IN LOWER(title)) > 0"));
        assert!(!sql.contains("DROP TABLE"));
        assert!(sql.ends_with("ORDER BY due_date ASC, id ASC"));
    }

    #[test]
    fn test_title_sort_uses_code_point_collation() {
        let sql = sql_for(ListTasksParams {
            sort_by: Some("title".to_string()),
            sort_order: Some("desc".to_string()),
            ..Default::default()
        });

        assert!(sql.ends_with("ORDER BY LOWER(title) COLLATE \"C\" DESC, id ASC"));
    }

    #[test]
    fn test_unknown_values_never_reach_sql() {
        let sql = sql_for(ListTasksParams {
            status: Some("Archived".to_string()),
            sort_by: Some("title; DELETE FROM tasks".to_string()),
            ..Default::default()
        });

        assert!(sql.contains("AND FALSE"));
        assert!(!sql.contains("Archived"));
        assert!(!sql.contains("DELETE"));
        assert!(sql.ends_with("ORDER BY created_at DESC, id ASC"));
    }
}
