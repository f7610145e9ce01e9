use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::Utc;
use kanban_shared::api::{
    BoardDetail, BoardSummary, BoardUpdateView, CreateBoardRequest, FromJson, TaskSummary,
    UpdateBoardRequest, UserSummary,
};
use kanban_shared::policy::{self, Action};
use kanban_shared::stats::BoardCounts;
use kanban_shared::validation::{self, ValidationErrors};
use kanban_shared::{dedup_members, Board};
use serde_json::Value;
use uuid::Uuid;

use super::lookup::{require_users, task_views, user_summaries};
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::extract::{IdPath, Payload};
use crate::routes::AppState;

/// Loads a board and checks `action` against it. Absent and invisible boards
/// look the same to the caller.
async fn authorized_board(
    state: &AppState,
    user: &AuthUser,
    board_id: Uuid,
    action: Action,
) -> Result<Board, AppError> {
    let board = state.store.find_board(board_id).await?;
    policy::board(user.id, action, board.as_ref()).into_result()?;
    board.ok_or(AppError::NotFound)
}

/// GET /api/boards/
pub async fn list_boards(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<BoardSummary>>, AppError> {
    let boards = state.store.boards_for(user.id).await?;

    let mut summaries = Vec::with_capacity(boards.len());
    for board in &boards {
        let tasks = state.store.board_tasks(board.id).await?;
        summaries.push(BoardSummary::new(board, BoardCounts::tally(board, &tasks)));
    }

    Ok(Json(summaries))
}

/// POST /api/boards/
pub async fn create_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Payload(body): Payload<Value>,
) -> Result<(StatusCode, Json<BoardSummary>), AppError> {
    policy::board(user.id, Action::Create, None).into_result()?;
    let req = CreateBoardRequest::from_json(body)?;

    let mut errors = ValidationErrors::new();
    let title = validation::title(&mut errors, req.title, true);
    let members = dedup_members(req.members);
    require_users(state.store.as_ref(), &mut errors, "members", &members).await?;
    let Some(title) = title.filter(|_| errors.is_empty()) else {
        return Err(errors.into());
    };

    let board = Board {
        id: Uuid::new_v4(),
        title,
        owner_id: user.id,
        members,
        created_at: Utc::now(),
    };
    state.store.insert_board(&board).await?;

    tracing::info!(board_id = %board.id, owner_id = %user.id, "Board created");

    let counts = BoardCounts::tally(&board, &[]);
    Ok((StatusCode::CREATED, Json(BoardSummary::new(&board, counts))))
}

/// GET /api/boards/:id/
pub async fn get_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(board_id): IdPath<Uuid>,
) -> Result<Json<BoardDetail>, AppError> {
    let board = authorized_board(&state, &user, board_id, Action::Read).await?;

    let tasks = state.store.board_tasks(board.id).await?;
    let members = user_summaries(state.store.as_ref(), &board.members).await?;
    let views = task_views(state.store.as_ref(), &tasks).await?;

    Ok(Json(BoardDetail {
        id: board.id,
        title: board.title.clone(),
        owner_id: board.owner_id,
        counts: BoardCounts::tally(&board, &tasks),
        members,
        tasks: views.into_iter().map(TaskSummary::from).collect(),
    }))
}

/// PATCH /api/boards/:id/
pub async fn update_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(board_id): IdPath<Uuid>,
    Payload(body): Payload<Value>,
) -> Result<Json<BoardUpdateView>, AppError> {
    let mut board = authorized_board(&state, &user, board_id, Action::Update).await?;
    let req = UpdateBoardRequest::from_json(body)?;

    let mut errors = ValidationErrors::new();
    let title = validation::title(&mut errors, req.title, false);
    let members = req.members.map(dedup_members);
    if let Some(members) = &members {
        require_users(state.store.as_ref(), &mut errors, "members", members).await?;
    }
    errors.into_result()?;

    if let Some(title) = title {
        board.title = title;
    }
    if let Some(members) = members {
        board.members = members;
    }

    if !state.store.update_board(&board).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(board_id = %board.id, "Board updated");

    let owner = state
        .store
        .find_user(board.owner_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let members_data = user_summaries(state.store.as_ref(), &board.members).await?;

    Ok(Json(BoardUpdateView {
        id: board.id,
        title: board.title,
        owner_data: UserSummary::from(&owner),
        members_data,
    }))
}

/// DELETE /api/boards/:id/
pub async fn delete_board(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    IdPath(board_id): IdPath<Uuid>,
) -> Result<StatusCode, AppError> {
    let board = authorized_board(&state, &user, board_id, Action::Delete).await?;

    if !state.store.delete_board(board.id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(
        board_id = %board.id,
        deleted_by = %user.id,
        "Board deleted with its tasks and comments"
    );

    Ok(StatusCode::NO_CONTENT)
}
