//! Persistence port and its adapters.
//!
//! Handlers only ever talk to [`KanbanStore`]. [`PgStore`] backs production
//! deployments; [`MemoryStore`] keeps everything behind one lock and serves
//! local runs without a database as well as the test suite.

use std::collections::HashMap;

use async_trait::async_trait;
use kanban_shared::{Board, Comment, Task, User};
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique key is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The row a write hangs off (task of a comment, board of a task) is gone.
    #[error("referenced {0} no longer exists")]
    MissingParent(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Account data for a user that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

/// Which of the caller's visible tasks to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope {
    /// Every task on a board the caller owns or belongs to.
    Visible,
    AssignedTo,
    Reviewing,
}

#[async_trait]
pub trait KanbanStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// The user with `email` together with their password hash.
    async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>, StoreError>;

    /// Returns the user's existing token, or stores `candidate` and returns it.
    /// Concurrent callers for one user always get the same token back.
    async fn issue_token(&self, user_id: Uuid, candidate: String) -> Result<String, StoreError>;
    async fn user_for_token(&self, token: &str) -> Result<Option<User>, StoreError>;

    async fn insert_board(&self, board: &Board) -> Result<(), StoreError>;
    async fn find_board(&self, id: Uuid) -> Result<Option<Board>, StoreError>;
    /// Boards owned by `user_id` or listing them as a member, each once.
    async fn boards_for(&self, user_id: Uuid) -> Result<Vec<Board>, StoreError>;
    /// Writes title and member set. `false` when the board is gone.
    async fn update_board(&self, board: &Board) -> Result<bool, StoreError>;
    /// Removes the board with its tasks and their comments in one step.
    async fn delete_board(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn insert_task(&self, task: &Task) -> Result<(), StoreError>;
    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError>;
    async fn board_tasks(&self, board_id: Uuid) -> Result<Vec<Task>, StoreError>;
    async fn tasks_for(&self, user_id: Uuid, scope: TaskScope) -> Result<Vec<Task>, StoreError>;
    /// Writes every mutable column. `false` when the task is gone.
    async fn update_task(&self, task: &Task) -> Result<bool, StoreError>;
    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Stores a comment; id and timestamp are assigned here so that
    /// creation order and `created_at` order agree.
    async fn insert_comment(
        &self,
        task_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<Comment, StoreError>;
    async fn find_comment(&self, task_id: Uuid, id: Uuid) -> Result<Option<Comment>, StoreError>;
    /// Oldest first.
    async fn task_comments(&self, task_id: Uuid) -> Result<Vec<Comment>, StoreError>;
    /// Comment totals keyed by task id; tasks without comments are absent.
    async fn comment_counts(&self, task_ids: &[Uuid]) -> Result<HashMap<Uuid, usize>, StoreError>;
    async fn delete_comment(&self, id: Uuid) -> Result<bool, StoreError>;
}
