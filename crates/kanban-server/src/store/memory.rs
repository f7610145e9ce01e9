use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use kanban_shared::stats;
use kanban_shared::{Board, Comment, Task, User};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{KanbanStore, NewUser, StoreError, TaskScope};

#[derive(Default)]
struct State {
    /// Users with their password hashes, in registration order.
    users: Vec<(User, String)>,
    /// Token per user id.
    tokens: HashMap<Uuid, String>,
    boards: Vec<Board>,
    tasks: Vec<Task>,
    /// Insertion order is creation order.
    comments: Vec<Comment>,
}

impl State {
    fn user_exists(&self, id: Uuid) -> bool {
        self.users.iter().any(|(u, _)| u.id == id)
    }

    fn ensure_users(&self, ids: impl IntoIterator<Item = Uuid>) -> Result<(), StoreError> {
        for id in ids {
            if !self.user_exists(id) {
                return Err(StoreError::MissingParent("user"));
            }
        }
        Ok(())
    }

    fn board(&self, id: Uuid) -> Option<&Board> {
        self.boards.iter().find(|b| b.id == id)
    }
}

/// Process-local store. Every operation takes the single lock for its whole
/// duration, so multi-row changes are never observed half-done.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KanbanStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|(u, _)| u.email == user.email) {
            return Err(StoreError::Conflict(format!("email {} is taken", user.email)));
        }

        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: Utc::now(),
        };
        state.users.push((created.clone(), user.password_hash));
        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone()))
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .filter(|(u, _)| ids.contains(&u.id))
            .map(|(u, _)| u.clone())
            .collect())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|(u, _)| u.email == email)
            .map(|(u, _)| u.clone()))
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<(User, String)>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|(u, _)| u.email == email).cloned())
    }

    async fn issue_token(&self, user_id: Uuid, candidate: String) -> Result<String, StoreError> {
        let mut state = self.state.lock().await;
        if !state.user_exists(user_id) {
            return Err(StoreError::MissingParent("user"));
        }
        Ok(state.tokens.entry(user_id).or_insert(candidate).clone())
    }

    async fn user_for_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.lock().await;
        let Some(user_id) = state
            .tokens
            .iter()
            .find(|(_, key)| key.as_str() == token)
            .map(|(id, _)| *id)
        else {
            return Ok(None);
        };
        Ok(state
            .users
            .iter()
            .find(|(u, _)| u.id == user_id)
            .map(|(u, _)| u.clone()))
    }

    async fn insert_board(&self, board: &Board) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.ensure_users(std::iter::once(board.owner_id).chain(board.members.iter().copied()))?;
        if state.board(board.id).is_some() {
            return Err(StoreError::Conflict(format!("board {} exists", board.id)));
        }
        state.boards.push(board.clone());
        Ok(())
    }

    async fn find_board(&self, id: Uuid) -> Result<Option<Board>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.board(id).cloned())
    }

    async fn boards_for(&self, user_id: Uuid) -> Result<Vec<Board>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .boards
            .iter()
            .filter(|b| b.is_participant(user_id))
            .cloned()
            .collect())
    }

    async fn update_board(&self, board: &Board) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        state.ensure_users(board.members.iter().copied())?;
        let Some(stored) = state.boards.iter_mut().find(|b| b.id == board.id) else {
            return Ok(false);
        };
        stored.title = board.title.clone();
        stored.members = board.members.clone();
        Ok(true)
    }

    async fn delete_board(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let before = state.boards.len();
        state.boards.retain(|b| b.id != id);
        if state.boards.len() == before {
            return Ok(false);
        }

        let task_ids: Vec<Uuid> = state
            .tasks
            .iter()
            .filter(|t| t.board_id == id)
            .map(|t| t.id)
            .collect();
        state.tasks.retain(|t| t.board_id != id);
        state.comments.retain(|c| !task_ids.contains(&c.task_id));
        Ok(true)
    }

    async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.board(task.board_id).is_none() {
            return Err(StoreError::MissingParent("board"));
        }
        state.ensure_users(std::iter::once(task.created_by).chain(task.people()))?;
        state.tasks.push(task.clone());
        Ok(())
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn board_tasks(&self, board_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.board_id == board_id)
            .cloned()
            .collect())
    }

    async fn tasks_for(&self, user_id: Uuid, scope: TaskScope) -> Result<Vec<Task>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .tasks
            .iter()
            .filter(|t| {
                state
                    .board(t.board_id)
                    .is_some_and(|b| b.is_participant(user_id))
            })
            .filter(|t| match scope {
                TaskScope::Visible => true,
                TaskScope::AssignedTo => t.assignee_id == Some(user_id),
                TaskScope::Reviewing => t.reviewer_id == Some(user_id),
            })
            .cloned()
            .collect())
    }

    async fn update_task(&self, task: &Task) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        state.ensure_users(task.people())?;
        let Some(stored) = state.tasks.iter_mut().find(|t| t.id == task.id) else {
            return Ok(false);
        };
        // board, creator and creation time never change after insert
        stored.title = task.title.clone();
        stored.description = task.description.clone();
        stored.assignee_id = task.assignee_id;
        stored.reviewer_id = task.reviewer_id;
        stored.due_date = task.due_date;
        stored.status = task.status;
        stored.priority = task.priority;
        Ok(true)
    }

    async fn delete_task(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        if state.tasks.len() == before {
            return Ok(false);
        }
        state.comments.retain(|c| c.task_id != id);
        Ok(true)
    }

    async fn insert_comment(
        &self,
        task_id: Uuid,
        author_id: Uuid,
        content: String,
    ) -> Result<Comment, StoreError> {
        let mut state = self.state.lock().await;
        if !state.tasks.iter().any(|t| t.id == task_id) {
            return Err(StoreError::MissingParent("task"));
        }
        state.ensure_users([author_id])?;

        // Clamp to the newest comment so a clock step back cannot reorder.
        let mut created_at = Utc::now();
        if let Some(last) = state.comments.last() {
            created_at = created_at.max(last.created_at);
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            task_id,
            author_id,
            content,
            created_at,
        };
        state.comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, task_id: Uuid, id: Uuid) -> Result<Option<Comment>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .comments
            .iter()
            .find(|c| c.id == id && c.task_id == task_id)
            .cloned())
    }

    async fn task_comments(&self, task_id: Uuid) -> Result<Vec<Comment>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .comments
            .iter()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn comment_counts(&self, task_ids: &[Uuid]) -> Result<HashMap<Uuid, usize>, StoreError> {
        let state = self.state.lock().await;
        Ok(task_ids
            .iter()
            .map(|&id| (id, stats::comments_count(id, &state.comments)))
            .filter(|&(_, count)| count > 0)
            .collect())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        let before = state.comments.len();
        state.comments.retain(|c| c.id != id);
        Ok(state.comments.len() < before)
    }
}
