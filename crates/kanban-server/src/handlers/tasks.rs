use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use kanban_shared::api::{
    CreateTaskRequest, FromJson, PatchTaskRequest, ReplaceTaskRequest, TaskChanges, TaskPatchView,
    TaskView,
};
use kanban_shared::policy::{self, Action, ParentBoard};
use kanban_shared::validation::{self, ValidationErrors, REQUIRED};
use kanban_shared::{Board, Task};
use serde_json::Value;
use uuid::Uuid;

use super::lookup::{task_view, task_views, task_with_board, users_by_id};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::extract::{IdPath, Payload};
use crate::routes::AppState;
use crate::store::{KanbanStore, TaskScope};

/// Checks each assignee/reviewer reference the payload sets: the user must
/// exist and take part in `board`. Fields are checked independently.
async fn check_people(
    store: &dyn KanbanStore,
    board: &Board,
    errors: &mut ValidationErrors,
    people: [(&str, Option<Uuid>); 2],
) -> Result<(), AppError> {
    let ids: Vec<Uuid> = people.iter().filter_map(|(_, id)| *id).collect();
    let known = users_by_id(store, &ids).await?;

    for (field, id) in people {
        let Some(id) = id else { continue };
        if known.contains_key(&id) {
            validation::participant(errors, board, field, id);
        } else {
            errors.add(field, validation::invalid_pk(id));
        }
    }
    Ok(())
}

/// Validates `changes` against the task's board and applies them.
async fn apply_changes(
    store: &dyn KanbanStore,
    board: &Board,
    task: &mut Task,
    mut changes: TaskChanges,
    mut errors: ValidationErrors,
    title_required: bool,
) -> Result<(), AppError> {
    changes.title = validation::title(&mut errors, changes.title, title_required);
    check_people(
        store,
        board,
        &mut errors,
        [
            ("assignee_id", changes.assignee_id.flatten()),
            ("reviewer_id", changes.reviewer_id.flatten()),
        ],
    )
    .await?;
    errors.into_result()?;

    changes.apply(task);
    if !store.update_task(task).await? {
        return Err(AppError::NotFound);
    }
    Ok(())
}

async fn list_scoped(
    state: &AppState,
    user: &AuthUser,
    scope: TaskScope,
) -> Result<Json<Vec<TaskView>>, AppError> {
    let tasks = state.store.tasks_for(user.id, scope).await?;
    Ok(Json(task_views(state.store.as_ref(), &tasks).await?))
}

/// GET /api/tasks/
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<TaskView>>, AppError> {
    list_scoped(&state, &user, TaskScope::Visible).await
}

/// GET /api/tasks/assigned-to-me/
pub async fn assigned_to_me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<TaskView>>, AppError> {
    list_scoped(&state, &user, TaskScope::AssignedTo).await
}

/// GET /api/tasks/reviewing/
pub async fn reviewing(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<TaskView>>, AppError> {
    list_scoped(&state, &user, TaskScope::Reviewing).await
}

/// POST /api/tasks/
///
/// The body is decoded before the access check, which needs its `board`.
pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Payload(body): Payload<Value>,
) -> Result<(StatusCode, Json<TaskView>), AppError> {
    let req = CreateTaskRequest::from_json(body)?;
    let board = match req.board {
        Some(board_id) => state.store.find_board(board_id).await?,
        None => None,
    };
    let parent = match (req.board, &board) {
        (None, _) => ParentBoard::Missing,
        (Some(_), None) => ParentBoard::Unknown,
        (Some(_), Some(board)) => ParentBoard::Found(board),
    };
    policy::task_create(user.id, parent).into_result()?;
    let board = board.ok_or(AppError::NotFound)?;

    let mut errors = ValidationErrors::new();
    let title = validation::title(&mut errors, req.title, true);
    check_people(
        state.store.as_ref(),
        &board,
        &mut errors,
        [("assignee_id", req.assignee_id), ("reviewer_id", req.reviewer_id)],
    )
    .await?;
    let Some(title) = title.filter(|_| errors.is_empty()) else {
        return Err(errors.into());
    };

    let task = Task {
        id: Uuid::new_v4(),
        board_id: board.id,
        title,
        description: req.description.unwrap_or_default(),
        created_by: user.id,
        assignee_id: req.assignee_id,
        reviewer_id: req.reviewer_id,
        due_date: req.due_date,
        status: req.status.unwrap_or_default(),
        priority: req.priority.unwrap_or_default(),
        created_at: Utc::now(),
    };
    state.store.insert_task(&task).await?;

    tracing::info!(
        task_id = %task.id,
        board_id = %board.id,
        created_by = %user.id,
        "Task created"
    );

    let view = task_view(state.store.as_ref(), &task).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/tasks/:id/
pub async fn get_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(task_id): IdPath<Uuid>,
) -> Result<Json<TaskView>, AppError> {
    let (task, board) = task_with_board(state.store.as_ref(), task_id).await?;
    policy::task(user.id, Action::Read, &task, &board).into_result()?;

    Ok(Json(task_view(state.store.as_ref(), &task).await?))
}

/// PUT /api/tasks/:id/
pub async fn replace_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(task_id): IdPath<Uuid>,
    Payload(body): Payload<Value>,
) -> Result<Json<TaskView>, AppError> {
    let (mut task, board) = task_with_board(state.store.as_ref(), task_id).await?;
    policy::task(user.id, Action::Update, &task, &board).into_result()?;

    let (board_ref, changes) = ReplaceTaskRequest::from_json(body)?.into_parts();
    let mut errors = ValidationErrors::new();
    match board_ref {
        None => errors.add("board", REQUIRED),
        Some(board_id) => {
            if let Err(e) = validation::board_unchanged(task.board_id, Some(board_id)) {
                errors.merge(e);
            }
        }
    }

    apply_changes(state.store.as_ref(), &board, &mut task, changes, errors, true).await?;
    tracing::info!(task_id = %task.id, updated_by = %user.id, "Task replaced");

    Ok(Json(task_view(state.store.as_ref(), &task).await?))
}

/// PATCH /api/tasks/:id/
///
/// The body is read as raw JSON first: the patch shape has no `board` field,
/// yet a `board` key naming another board must still be rejected.
pub async fn patch_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(task_id): IdPath<Uuid>,
    Payload(raw): Payload<Value>,
) -> Result<Json<TaskPatchView>, AppError> {
    let (mut task, board) = task_with_board(state.store.as_ref(), task_id).await?;
    policy::task(user.id, Action::Update, &task, &board).into_result()?;

    let mut errors = ValidationErrors::new();
    if let Err(e) = validation::raw_board_unchanged(task.board_id, raw.get("board")) {
        errors.merge(e);
    }
    let req = match PatchTaskRequest::from_json(raw) {
        Ok(req) => req,
        Err(e) => {
            errors.merge(e);
            return Err(errors.into());
        }
    };

    let changes = TaskChanges::from(req);
    apply_changes(state.store.as_ref(), &board, &mut task, changes, errors, false).await?;
    tracing::info!(task_id = %task.id, updated_by = %user.id, "Task patched");

    let view = task_view(state.store.as_ref(), &task).await?;
    Ok(Json(TaskPatchView::from(view)))
}

/// DELETE /api/tasks/:id/
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(task_id): IdPath<Uuid>,
) -> Result<StatusCode, AppError> {
    let (task, board) = task_with_board(state.store.as_ref(), task_id).await?;
    policy::task(user.id, Action::Delete, &task, &board).into_result()?;

    if !state.store.delete_task(task.id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(task_id = %task.id, deleted_by = %user.id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}
