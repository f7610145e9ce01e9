use axum::{extract::State, http::StatusCode, Extension, Json};
use kanban_shared::api::{CommentView, CreateCommentRequest, FromJson};
use kanban_shared::policy::{self, Action};
use kanban_shared::validation::{self, ValidationErrors};
use kanban_shared::Comment;
use serde_json::Value;
use uuid::Uuid;

use super::lookup::{task_with_board, users_by_id};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::extract::{IdPath, Payload};
use crate::routes::AppState;

/// Loads a single comment of `task_id` and checks `action` against it.
async fn authorized_comment(
    state: &AppState,
    user: &AuthUser,
    task_id: Uuid,
    comment_id: Uuid,
    action: Action,
) -> Result<Comment, AppError> {
    let (_, board) = task_with_board(state.store.as_ref(), task_id).await?;
    // Non-participants learn nothing about which comment ids exist.
    policy::comments(user.id, Action::Read, &board).into_result()?;

    let comment = state
        .store
        .find_comment(task_id, comment_id)
        .await?
        .ok_or(AppError::NotFound)?;
    policy::comment(user.id, action, &comment, &board).into_result()?;

    Ok(comment)
}

async fn comment_view(state: &AppState, comment: &Comment) -> Result<CommentView, AppError> {
    let author = state
        .store
        .find_user(comment.author_id)
        .await?
        .map(|u| u.full_name())
        .unwrap_or_default();
    Ok(CommentView::new(comment, author))
}

/// GET /api/tasks/:id/comments/
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(task_id): IdPath<Uuid>,
) -> Result<Json<Vec<CommentView>>, AppError> {
    let (task, board) = task_with_board(state.store.as_ref(), task_id).await?;
    policy::comments(user.id, Action::Read, &board).into_result()?;

    let comments = state.store.task_comments(task.id).await?;

    let mut author_ids: Vec<Uuid> = comments.iter().map(|c| c.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let authors = users_by_id(state.store.as_ref(), &author_ids).await?;

    let views = comments
        .iter()
        .map(|c| {
            let author = authors
                .get(&c.author_id)
                .map(|u| u.full_name())
                .unwrap_or_default();
            CommentView::new(c, author)
        })
        .collect();

    Ok(Json(views))
}

/// POST /api/tasks/:id/comments/
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(task_id): IdPath<Uuid>,
    Payload(body): Payload<Value>,
) -> Result<(StatusCode, Json<CommentView>), AppError> {
    let (task, board) = task_with_board(state.store.as_ref(), task_id).await?;
    policy::comments(user.id, Action::Create, &board).into_result()?;
    let req = CreateCommentRequest::from_json(body)?;

    let mut errors = ValidationErrors::new();
    let content = validation::required_text(&mut errors, "content", req.content);
    let Some(content) = content.filter(|_| errors.is_empty()) else {
        return Err(errors.into());
    };

    let comment = state.store.insert_comment(task.id, user.id, content).await?;

    tracing::info!(
        comment_id = %comment.id,
        task_id = %task.id,
        author_id = %user.id,
        "Comment created"
    );

    let view = CommentView::new(&comment, user.full_name.clone());
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/tasks/:id/comments/:comment_id/
pub async fn get_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath((task_id, comment_id)): IdPath<(Uuid, Uuid)>,
) -> Result<Json<CommentView>, AppError> {
    let comment = authorized_comment(&state, &user, task_id, comment_id, Action::Read).await?;
    Ok(Json(comment_view(&state, &comment).await?))
}

/// DELETE /api/tasks/:id/comments/:comment_id/
pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath((task_id, comment_id)): IdPath<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let comment = authorized_comment(&state, &user, task_id, comment_id, Action::Delete).await?;

    if !state.store.delete_comment(comment.id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(comment_id = %comment.id, deleted_by = %user.id, "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}
