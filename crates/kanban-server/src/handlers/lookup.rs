//! Loading helpers shared by the resource handlers.

use std::collections::HashMap;

use kanban_shared::api::{TaskView, UserSummary};
use kanban_shared::validation::{self, ValidationErrors};
use kanban_shared::{Board, Task, User};
use uuid::Uuid;

use crate::error::AppError;
use crate::store::KanbanStore;

/// Users referenced by `ids`, keyed by id. Unknown ids are simply absent.
pub async fn users_by_id(
    store: &dyn KanbanStore,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, User>, AppError> {
    let users = store.find_users(ids).await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

/// Summaries for `ids` in the given order, skipping any that vanished.
pub async fn user_summaries(
    store: &dyn KanbanStore,
    ids: &[Uuid],
) -> Result<Vec<UserSummary>, AppError> {
    let users = users_by_id(store, ids).await?;
    Ok(ids
        .iter()
        .filter_map(|id| users.get(id))
        .map(UserSummary::from)
        .collect())
}

/// Records `invalid_pk` under `field` for every id with no user behind it.
pub async fn require_users(
    store: &dyn KanbanStore,
    errors: &mut ValidationErrors,
    field: &str,
    ids: &[Uuid],
) -> Result<(), AppError> {
    let known = users_by_id(store, ids).await?;
    for id in ids.iter().filter(|id| !known.contains_key(*id)) {
        errors.add(field, validation::invalid_pk(id));
    }
    Ok(())
}

/// The task together with its board. A task whose board is gone is treated
/// as gone too.
pub async fn task_with_board(
    store: &dyn KanbanStore,
    task_id: Uuid,
) -> Result<(Task, Board), AppError> {
    let task = store.find_task(task_id).await?.ok_or(AppError::NotFound)?;
    let board = store.find_board(task.board_id).await?.ok_or(AppError::NotFound)?;
    Ok((task, board))
}

/// Full read shapes for `tasks`, with nested people and fresh comment counts.
pub async fn task_views(
    store: &dyn KanbanStore,
    tasks: &[Task],
) -> Result<Vec<TaskView>, AppError> {
    let mut people: Vec<Uuid> = tasks.iter().flat_map(Task::people).collect();
    people.sort_unstable();
    people.dedup();

    let users = users_by_id(store, &people).await?;
    let task_ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
    let counts = store.comment_counts(&task_ids).await?;

    Ok(tasks
        .iter()
        .map(|task| {
            let summary =
                |id: Option<Uuid>| id.and_then(|id| users.get(&id)).map(UserSummary::from);
            TaskView::new(
                task,
                summary(task.assignee_id),
                summary(task.reviewer_id),
                counts.get(&task.id).copied().unwrap_or(0),
            )
        })
        .collect())
}

pub async fn task_view(store: &dyn KanbanStore, task: &Task) -> Result<TaskView, AppError> {
    let mut views = task_views(store, std::slice::from_ref(task)).await?;
    views.pop().ok_or(AppError::NotFound)
}
