use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::auth::auth_middleware;
use crate::handlers::{
    boards as board_handlers, comments as comment_handlers, identity as identity_handlers,
    tasks as task_handlers,
};
use crate::store::KanbanStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KanbanStore>,
}

pub fn create_router(store: Arc<dyn KanbanStore>) -> Router {
    let state = AppState { store };

    // Public identity routes (no middleware)
    let public_routes = Router::new()
        .route("/registration/", post(identity_handlers::register))
        .route("/login/", post(identity_handlers::login));

    let board_routes = Router::new()
        .route(
            "/boards/",
            get(board_handlers::list_boards).post(board_handlers::create_board),
        )
        .route(
            "/boards/:id/",
            get(board_handlers::get_board)
                .patch(board_handlers::update_board)
                .delete(board_handlers::delete_board),
        );

    // Static segments win over `:id`, so the two listings never reach get_task.
    let task_routes = Router::new()
        .route(
            "/tasks/",
            get(task_handlers::list_tasks).post(task_handlers::create_task),
        )
        .route("/tasks/assigned-to-me/", get(task_handlers::assigned_to_me))
        .route("/tasks/reviewing/", get(task_handlers::reviewing))
        .route(
            "/tasks/:id/",
            get(task_handlers::get_task)
                .put(task_handlers::replace_task)
                .patch(task_handlers::patch_task)
                .delete(task_handlers::delete_task),
        );

    let comment_routes = Router::new()
        .route(
            "/tasks/:id/comments/",
            get(comment_handlers::list_comments).post(comment_handlers::create_comment),
        )
        .route(
            "/tasks/:id/comments/:comment_id/",
            get(comment_handlers::get_comment).delete(comment_handlers::delete_comment),
        );

    // Protected routes with auth middleware
    let protected_routes = Router::new()
        .route("/email-check/", get(identity_handlers::email_check))
        .merge(board_routes)
        .merge(task_routes)
        .merge(comment_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new().merge(public_routes).merge(protected_routes);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
