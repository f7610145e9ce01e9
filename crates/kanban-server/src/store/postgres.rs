use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kanban_shared::{Board, Comment, Task, User};
use uuid::Uuid;

use super::{KanbanStore, NewUser, StoreError, TaskScope};
use crate::db::DbPool;

const USER_COLUMNS: &str = "id, email, first_name, last_name, created_at";

const TASK_COLUMNS: &str = r#"
    t.id, t.board_id, t.title, t.description, t.created_by, t.assignee_id,
    t.reviewer_id, t.due_date, t.status, t.priority, t.created_at
"#;

const BOARD_SELECT: &str = r#"
    SELECT b.id, b.title, b.owner_id, b.created_at,
           COALESCE(
               array_agg(m.user_id ORDER BY m.position) FILTER (WHERE m.user_id IS NOT NULL),
               '{}'
           ) AS members
    FROM boards b
    LEFT JOIN board_members m ON m.board_id = b.id
"#;

const INSERT_MEMBER: &str =
    "INSERT INTO board_members (board_id, user_id, position) VALUES ($1, $2, $3)";

/// Caller (bound as `$1`) owns the board `b` or is one of its members.
const PARTICIPANT_FILTER: &str = r#"
    (b.owner_id = $1 OR EXISTS (
        SELECT 1 FROM board_members p WHERE p.board_id = b.id AND p.user_id = $1
    ))
"#;

#[derive(sqlx::FromRow)]
struct BoardRow {
    id: Uuid,
    title: String,
    owner_id: Uuid,
    created_at: DateTime<Utc>,
    members: Vec<Uuid>,
}

impl From<BoardRow> for Board {
    fn from(row: BoardRow) -> Self {
        Board {
            id: row.id,
            title: row.title,
            owner_id: row.owner_id,
            members: row.members,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

fn map_write_error(e: sqlx::Error, parent: &'static str) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StoreError::Conflict(db.message().to_string());
        }
        if db.is_foreign_key_violation() {
            return StoreError::MissingParent(parent);
        }
    }
    StoreError::Database(e)
}

#[derive(Clone)]
pub struct PgStore {
    db: DbPool,
}

impl PgStore {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KanbanStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let query = format!(
            r#"
            INSERT INTO users (id, email, first_name, last_name, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.password_hash)
            .bind(Utc::now())
            .fetch_one(&self.db)
            .await
            .map_err(|e| map_write_error(e, "user"))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)");
        let users = sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(&self.db)
            .await?;
        Ok(users)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, CredentialRow>(&query)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    async fn issue_token(&self, user_id: Uuid, candidate: String) -> Result<String, StoreError> {
        // The unique index on user_id makes a racing insert wait for the
        // winner and then do nothing, so the select below sees one token.
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (key, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(&candidate)
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(|e| map_write_error(e, "user"))?;

        let (key,): (String,) = sqlx::query_as("SELECT key FROM auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.db)
            .await?;
        Ok(key)
    }

    async fn user_for_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.first_name, u.last_name, u.created_at
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.key = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert_board(&self, board: &Board) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO boards (id, title, owner_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(board.id)
        .bind(&board.title)
        .bind(board.owner_id)
        .bind(board.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "user"))?;

        for (position, user_id) in board.members.iter().enumerate() {
            sqlx::query(INSERT_MEMBER)
                .bind(board.id)
                .bind(user_id)
                .bind(position as i32)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_write_error(e, "user"))?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_board(&self, id: Uuid) -> Result<Option<Board>, StoreError> {
        let query = format!("{BOARD_SELECT} WHERE b.id = $1 GROUP BY b.id");
        let row = sqlx::query_as::<_, BoardRow>(&query)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Board::from))
    }

    async fn boards_for(&self, user_id: Uuid) -> Result<Vec<Board>, StoreError> {
        let query = format!(
            "{BOARD_SELECT} WHERE {PARTICIPANT_FILTER} GROUP BY b.id ORDER BY b.created_at, b.id"
        );
        let rows = sqlx::query_as::<_, BoardRow>(&query)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Board::from).collect())
    }

    async fn update_board(&self, board: &Board) -> Result<bool, StoreError> {
        let mut tx = self.db.begin().await?;

        let result = sqlx::query("UPDATE boards SET title = $1 WHERE id = $2")
            .bind(&board.title)
            .bind(board.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM board_members WHERE board_id = $1")
            .bind(board.id)
            .execute(&mut *tx)
            .await?;

        for (position, user_id) in board.members.iter().enumerate() {
            sqlx::query(INSERT_MEMBER)
                .bind(board.id)
                .bind(user_id)
                .bind(position as i32)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_write_error(e, "user"))?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn delete_board(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.db.begin().await?;

        // Foreign keys cascade as well; deleting children explicitly keeps the
        // whole removal inside this transaction regardless of schema drift.
        sqlx::query(
            "DELETE FROM comments WHERE task_id IN (SELECT id FROM tasks WHERE board_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM tasks WHERE board_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM board_members WHERE board_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, board_id, title, description, created_by, assignee_id,
                               reviewer_id, due_date, status, priority, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(task.id)
        .bind(task.board_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.created_by)
        .bind(task.assignee_id)
        .bind(task.reviewer_id)
        .bind(task.due_date)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| map_write_error(e, "board"))?;

        Ok(())
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = $1");
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(task)
    }

    async fn board_tasks(&self, board_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks t WHERE t.board_id = $1 ORDER BY t.created_at, t.id"
        );
        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(board_id)
            .fetch_all(&self.db)
            .await?;
        Ok(tasks)
    }

    async fn tasks_for(&self, user_id: Uuid, scope: TaskScope) -> Result<Vec<Task>, StoreError> {
        let narrowing = match scope {
            TaskScope::Visible => "",
            TaskScope::AssignedTo => "AND t.assignee_id = $1",
            TaskScope::Reviewing => "AND t.reviewer_id = $1",
        };
        let query = format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks t
            JOIN boards b ON b.id = t.board_id
            WHERE {PARTICIPANT_FILTER} {narrowing}
            ORDER BY t.created_at, t.id
            "#
        );
        let tasks = sqlx::query_as::<_, Task>(&query)
            .bind(user_id)
            .fetch_all(&self.db)
            .await?;
        Ok(tasks)
    }

    async fn update_task(&self, task: &Task) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = $1,
                description = $2,
                assignee_id = $3,
                reviewer_id = $4,
                due_date = $5,
                status = $6,
                priority = $7
            WHERE id = $8
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.assignee_id)
        .bind(task.reviewer_id)
        .bind(task.due_date)
        .bind(task.status)
        .bind(task.priority)
        .bind(task.id)
        .execute(&self.db)
        .await
        .map_err(|e| map_write_error(e, "user"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM comments WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_comment(
        &self,
        task_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<Comment, StoreError> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, task_id, author_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING id, task_id, author_id, content, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(task_id)
        .bind(author_id)
        .bind(&content)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_write_error(e, "task"))
    }

    async fn find_comment(&self, task_id: Uuid, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, author_id, content, created_at
            FROM comments
            WHERE id = $1 AND task_id = $2
            "#,
        )
        .bind(id)
        .bind(task_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(comment)
    }

    async fn task_comments(&self, task_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, task_id, author_id, content, created_at
            FROM comments
            WHERE task_id = $1
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.db)
        .await?;
        Ok(comments)
    }

    async fn comment_counts(&self, task_ids: &[Uuid]) -> Result<HashMap<Uuid, usize>, StoreError> {
        if task_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT task_id, COUNT(*) FROM comments WHERE task_id = ANY($1) GROUP BY task_id",
        )
        .bind(task_ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(task_id, count)| (task_id, usize::try_from(count).unwrap_or_default()))
            .collect())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
