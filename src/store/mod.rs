//! Persistence seams for tasks and users.

mod memory;
mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Task, User};
use crate::query::TaskFilter;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("duplicate record: {0}")]
    Duplicate(String),

    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: Uuid, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Every task owned by `owner`, newest first.
    async fn find_by_owner(&self, owner: Uuid) -> StoreResult<Vec<Task>>;

    /// Tasks owned by `owner` that match `filter`, in the filter's order.
    async fn find_by_owner_with_filter(
        &self,
        owner: Uuid,
        filter: &TaskFilter,
    ) -> StoreResult<Vec<Task>>;

    /// Looks a task up regardless of owner; callers check ownership.
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>>;

    async fn insert(&self, task: &Task) -> StoreResult<()>;

    /// Overwrites the mutable fields of an existing task. Returns `false`
    /// when no task has that id.
    async fn replace(&self, task: &Task) -> StoreResult<bool>;

    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
}
